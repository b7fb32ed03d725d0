mod container_test {
    use autowire::config::ContainerConfig;
    use autowire::container::{ContainerBuilder, ContainerError};
    use autowire_di::component::ComponentType;
    use autowire_di::instance_provider::ComponentInstancePtr;
    use autowire_di::ComponentRegistryError;
    use std::sync::{Arc, Mutex};
    use std::thread;

    mod components {
        use autowire_di::instance_provider::ComponentInstancePtr;
        use autowire_di::{component_alias, injectable, Component, Discoverable};

        pub const NAMESPACE: &str = module_path!();

        #[injectable]
        pub trait Notifier {
            fn channel(&self) -> &'static str;
        }

        #[derive(Component)]
        pub struct EmailNotifier;

        #[component_alias]
        impl Notifier for EmailNotifier {
            fn channel(&self) -> &'static str {
                "email"
            }
        }

        #[derive(Component)]
        pub struct UserService {
            pub notifier: ComponentInstancePtr<dyn Notifier + Send + Sync>,
        }

        #[allow(dead_code)]
        #[derive(Discoverable)]
        pub struct UserDto {
            pub name: String,
        }
    }

    mod unrelated {
        use autowire_di::Component;

        #[derive(Component)]
        pub struct Unrelated;
    }

    use components::{EmailNotifier, Notifier, UserService};

    fn config() -> ContainerConfig {
        ContainerConfig::default()
            .with_root_namespace(components::NAMESPACE)
            .with_install_tracing_logger(false)
    }

    #[test]
    fn should_discover_root_namespace_on_first_access() {
        let events = Arc::new(Mutex::new(vec![]));
        let listener_events = events.clone();

        let container = ContainerBuilder::new()
            .with_config(config().with_discover_on_first_access(true))
            .with_post_add_listener(move |component_type: &ComponentType| {
                listener_events
                    .lock()
                    .unwrap()
                    .push(component_type.simple_name);
            })
            .build()
            .unwrap();

        let service = container.get_bean::<UserService>().unwrap();
        assert_eq!(service.notifier.channel(), "email");
        assert_eq!(*events.lock().unwrap(), ["EmailNotifier", "UserService"]);

        assert!(matches!(
            container.get_bean::<unrelated::Unrelated>().err().unwrap(),
            ContainerError::Registry(ComponentRegistryError::InstanceNotFound(_))
        ));
    }

    #[test]
    fn should_init_explicit_namespace() {
        let container = ContainerBuilder::new()
            .with_config(config())
            .build()
            .unwrap();

        let report = container.init(components::NAMESPACE).unwrap();
        assert_eq!(report.visited, 3);
        assert_eq!(report.registered, 2);

        let notifier = container
            .get_qualified_bean::<dyn Notifier + Send + Sync>("EmailNotifier")
            .unwrap();
        assert_eq!(notifier.channel(), "email");
    }

    #[test]
    fn should_share_instances_between_threads() {
        let container = Arc::new(
            ContainerBuilder::new()
                .with_config(config())
                .build()
                .unwrap(),
        );
        container.register_component::<EmailNotifier>().unwrap();
        container.register_component::<UserService>().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let container = container.clone();
                thread::spawn(move || container.get_bean::<EmailNotifier>().unwrap())
            })
            .collect();

        let expected = container.get_bean::<EmailNotifier>().unwrap();
        for handle in handles {
            let instance: ComponentInstancePtr<EmailNotifier> = handle.join().unwrap();
            assert!(ComponentInstancePtr::ptr_eq(&instance, &expected));
        }
    }
}
