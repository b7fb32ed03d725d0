#[cfg(feature = "derive")]
mod component_derive_test {
    use autowire_di::component::{Component, Injectable};
    use autowire_di::component_registry::ComponentRegistry;
    use autowire_di::instance_provider::{ComponentInstancePtr, TypedComponentInstanceProvider};
    use autowire_di::{component_alias, injectable, Component, ComponentRegistryError};
    use std::any::TypeId;
    use std::sync::Mutex;

    #[injectable]
    trait Storage {
        fn kind(&self) -> &'static str;
    }

    #[derive(Component)]
    struct MemoryStorage;

    #[component_alias]
    impl Storage for MemoryStorage {
        fn kind(&self) -> &'static str {
            "memory"
        }
    }

    #[derive(Component)]
    struct FileStorage;

    #[component_alias]
    impl Storage for FileStorage {
        fn kind(&self) -> &'static str {
            "file"
        }
    }

    #[derive(Component)]
    #[component(post_construct = ["init", "verify"])]
    struct Repository {
        memory: ComponentInstancePtr<MemoryStorage>,
        #[component(qualifier = "FileStorage")]
        storage: ComponentInstancePtr<dyn Storage + Send + Sync>,
        #[component(default)]
        retries: u8,
        #[component(default = "default_name")]
        name: String,
        #[component(default)]
        events: Mutex<Vec<&'static str>>,
    }

    impl Repository {
        fn init(&self) {
            self.events.lock().unwrap().push("init");
        }

        fn verify(&self) -> Result<(), String> {
            self.events.lock().unwrap().push("verify");
            Ok(())
        }
    }

    fn default_name() -> String {
        "default".to_string()
    }

    #[derive(Component)]
    struct Wrapper(
        ComponentInstancePtr<MemoryStorage>,
        #[component(default = "default_name")] String,
    );

    #[derive(Component)]
    struct Consumer {
        storage: ComponentInstancePtr<dyn Storage + Send + Sync>,
    }

    struct Service {
        storage: ComponentInstancePtr<dyn Storage + Send + Sync>,
        constructor: &'static str,
    }

    #[autowire_di::component]
    impl Service {
        fn with_memory(
            #[qualifier("MemoryStorage")] storage: ComponentInstancePtr<dyn Storage + Send + Sync>,
        ) -> Self {
            Self {
                storage,
                constructor: "with_memory",
            }
        }

        #[autowired]
        fn with_file(
            #[qualifier("FileStorage")] storage: ComponentInstancePtr<dyn Storage + Send + Sync>,
        ) -> Result<Self, String> {
            Ok(Self {
                storage,
                constructor: "with_file",
            })
        }

        #[post_construct]
        fn check(&self) -> Result<(), String> {
            if self.kind() == "file" {
                Ok(())
            } else {
                Err(format!("unexpected storage: {}", self.kind()))
            }
        }

        fn kind(&self) -> &'static str {
            self.storage.kind()
        }
    }

    struct Broken;

    #[autowire_di::component]
    impl Broken {
        fn new() -> Result<Self, String> {
            Err("broken".to_string())
        }
    }

    #[derive(Component)]
    #[component(post_construct = ["fail"])]
    struct Invalid;

    impl Invalid {
        fn fail(&self) -> Result<(), &'static str> {
            Err("invalid")
        }
    }

    #[derive(Component)]
    struct Chicken {
        _egg: ComponentInstancePtr<Egg>,
    }

    #[derive(Component)]
    struct Egg {
        _chicken: ComponentInstancePtr<Chicken>,
    }

    #[test]
    fn should_describe_derived_component() {
        let component_type = Repository::component_type();
        assert_eq!(component_type.simple_name, "Repository");
        assert_eq!(component_type.module_path, module_path!());
        assert!(component_type.is_component);

        let constructor = component_type.selected_constructor().unwrap();
        assert_eq!(constructor.parameters.len(), 2);
        assert_eq!(
            constructor.parameters[0].key.type_id,
            TypeId::of::<MemoryStorage>()
        );
        assert_eq!(constructor.parameters[1].qualifier, Some("FileStorage"));

        let hooks: Vec<_> = component_type
            .post_construct
            .iter()
            .map(|hook| hook.name)
            .collect();
        assert_eq!(hooks, ["init", "verify"]);
    }

    #[test]
    fn should_describe_impl_component() {
        let component_type = Service::component_type();
        let constructors: Vec<_> = component_type
            .constructors
            .iter()
            .map(|constructor| constructor.name)
            .collect();

        assert_eq!(constructors, ["with_memory", "with_file"]);
        assert_eq!(component_type.selected_constructor().unwrap().name, "with_file");
        assert_eq!(component_type.post_construct.len(), 1);
    }

    #[test]
    fn should_not_register_aliases_on_demand() {
        assert!(<dyn Storage + Send + Sync as Injectable>::registrable().is_none());
        assert!(<MemoryStorage as Injectable>::registrable().is_some());
    }

    #[test]
    fn should_inject_fields() {
        let mut registry = ComponentRegistry::new();
        registry.register_typed::<FileStorage>().unwrap();
        registry.register_typed::<Repository>().unwrap();

        let repository = registry.resolve_typed::<Repository>().unwrap();
        let memory = registry.resolve_typed::<MemoryStorage>().unwrap();

        assert!(ComponentInstancePtr::ptr_eq(&repository.memory, &memory));
        assert_eq!(repository.storage.kind(), "file");
        assert_eq!(repository.retries, 0);
        assert_eq!(repository.name, "default");
        assert_eq!(*repository.events.lock().unwrap(), ["init", "verify"]);
    }

    #[test]
    fn should_require_registered_qualified_dependency() {
        let mut registry = ComponentRegistry::new();

        assert!(matches!(
            registry.register_typed::<Repository>().unwrap_err(),
            ComponentRegistryError::DependencyNotFound { qualifier, .. } if qualifier == "FileStorage"
        ));
        assert!(!registry.is_registered_typed::<Repository>());
    }

    #[test]
    fn should_construct_tuple_struct() {
        let mut registry = ComponentRegistry::new();
        registry.register_typed::<Wrapper>().unwrap();

        let wrapper = registry.resolve_typed::<Wrapper>().unwrap();
        assert_eq!(wrapper.0.kind(), "memory");
        assert_eq!(wrapper.1, "default");
    }

    #[test]
    fn should_resolve_storage_by_qualifier() {
        let mut registry = ComponentRegistry::new();
        registry.register_typed::<MemoryStorage>().unwrap();
        registry.register_typed::<FileStorage>().unwrap();

        let storage = registry
            .resolve_qualified_typed::<dyn Storage + Send + Sync>("MemoryStorage")
            .unwrap();
        assert_eq!(storage.kind(), "memory");
    }

    #[test]
    fn should_inject_unique_alias() {
        let mut registry = ComponentRegistry::new();
        registry.register_typed::<FileStorage>().unwrap();
        registry.register_typed::<Consumer>().unwrap();

        let consumer = registry.resolve_typed::<Consumer>().unwrap();
        assert_eq!(consumer.storage.kind(), "file");
    }

    #[test]
    fn should_reject_ambiguous_alias() {
        let mut registry = ComponentRegistry::new();
        registry.register_typed::<MemoryStorage>().unwrap();
        registry.register_typed::<FileStorage>().unwrap();

        assert!(matches!(
            registry.register_typed::<Consumer>().unwrap_err(),
            ComponentRegistryError::AmbiguousDependency { candidates, .. }
                if candidates == ["MemoryStorage", "FileStorage"]
        ));
    }

    #[test]
    fn should_use_autowired_constructor() {
        let mut registry = ComponentRegistry::new();
        registry.register_typed::<MemoryStorage>().unwrap();
        registry.register_typed::<FileStorage>().unwrap();
        registry.register_typed::<Service>().unwrap();

        let service = registry.resolve_typed::<Service>().unwrap();
        assert_eq!(service.constructor, "with_file");
        assert_eq!(service.kind(), "file");
    }

    #[test]
    fn should_wrap_constructor_error() {
        let mut registry = ComponentRegistry::new();

        assert!(matches!(
            registry.register_typed::<Broken>().unwrap_err(),
            ComponentRegistryError::ComponentConstruction { error, .. } if error.to_string() == "broken"
        ));
        assert!(!registry.is_registered_typed::<Broken>());
    }

    #[test]
    fn should_evict_component_with_failing_hook() {
        let mut registry = ComponentRegistry::new();

        assert!(matches!(
            registry.register_typed::<Invalid>().unwrap_err(),
            ComponentRegistryError::PostConstructHook { method, .. } if method == "fail"
        ));
        assert!(matches!(
            registry.resolve_typed::<Invalid>().err().unwrap(),
            ComponentRegistryError::InstanceNotFound(_)
        ));
    }

    #[test]
    fn should_detect_circular_fields() {
        let mut registry = ComponentRegistry::new();

        assert!(matches!(
            registry.register_typed::<Chicken>().unwrap_err(),
            ComponentRegistryError::CircularDependency(_)
        ));
        assert!(registry.resolve_typed::<Chicken>().is_err());
        assert!(registry.resolve_typed::<Egg>().is_err());
        assert!(registry.is_empty());
    }
}
