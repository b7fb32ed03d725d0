//! One of the basic blocks of dependency injection is a [Component]. Components are injectable
//! objects, which themselves can contain dependencies to other components. Each component type is
//! described by a [ComponentType], which carries the declarative markers and the factory
//! functions used by the [ComponentRegistry](crate::component_registry::ComponentRegistry) to
//! build a single shared instance.
//!
//! ## Declaring components with struct fields
//!
//! The simplest way to declare a component is deriving `Component`, which uses struct fields as
//! constructor parameters. Each field should be a [ComponentInstancePtr] to another injectable
//! type:
//!
//! ```
//! use autowire_di::instance_provider::ComponentInstancePtr;
//! use autowire_di::{component_alias, injectable, Component};
//!
//! #[injectable]
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Component)]
//! struct EnglishGreeter;
//!
//! #[component_alias]
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello".to_string()
//!     }
//! }
//!
//! #[derive(Component)]
//! #[component(post_construct = ["init"])]
//! struct TestComponent {
//!     // concrete type dependency - registered on demand
//!     dependency: ComponentInstancePtr<EnglishGreeter>,
//!     // dyn Trait dependency selected by the simple name of the component type
//!     #[component(qualifier = "EnglishGreeter")]
//!     greeter: ComponentInstancePtr<dyn Greeter + Send + Sync>,
//!     #[component(default)]
//!     counter: i8,
//!     #[component(default = "dummy_expr")]
//!     default_expr: i8,
//! }
//!
//! impl TestComponent {
//!     fn init(&self) {}
//! }
//!
//! fn dummy_expr() -> i8 {
//!     -1
//! }
//! ```
//!
//! ### Supported `#[component]` struct configuration
//!
//! * `post_construct = ["method"]` - call given `&self` methods after construction, in the given
//! order; methods can return `()` or `Result<(), E>`
//!
//! ### Supported `#[component]` field configuration
//!
//! * `default` - use `Default::default()` initialization
//! * `default = "expr"` - call `expr()` for initialization
//! * `qualifier = "Name"` - inject the registered instance whose type is named `Name`
//!
//! ## Declaring components with constructors
//!
//! When construction requires custom logic, or there is more than one way to construct a type, the
//! `#[component]` attribute can be placed on an inherent `impl` block instead. Every associated
//! function returning `Self` or `Result<Self, E>` is a constructor. The one marked with
//! `#[autowired]` is used, falling back to the first declared constructor. Methods marked with
//! `#[post_construct]` are run after construction, in declaration order:
//!
//! ```
//! use autowire_di::instance_provider::ComponentInstancePtr;
//! use autowire_di::{component, Component};
//!
//! #[derive(Component)]
//! struct Repository;
//!
//! struct Service {
//!     repository: ComponentInstancePtr<Repository>,
//!     name: String,
//! }
//!
//! #[component]
//! impl Service {
//!     fn unnamed(repository: ComponentInstancePtr<Repository>) -> Self {
//!         Self::new(repository).unwrap()
//!     }
//!
//!     #[autowired]
//!     fn new(#[qualifier("Repository")] repository: ComponentInstancePtr<Repository>) -> Result<Self, String> {
//!         Ok(Self {
//!             repository,
//!             name: "service".to_string(),
//!         })
//!     }
//!
//!     #[post_construct]
//!     fn validate(&self) -> Result<(), String> {
//!         if self.name.is_empty() {
//!             Err("missing name".to_string())
//!         } else {
//!             Ok(())
//!         }
//!     }
//! }
//! ```
//!
//! ## Registering component aliases
//!
//! Aliases are `dyn Trait` types which can refer to concrete component types, which makes it
//! possible to depend on an abstraction rather than a concrete type. Each injectable trait should
//! be marked with `#[injectable]`, while each implementation with `#[component_alias]`. When more
//! than one registered component implements a given trait, dependencies should be qualified.
//!
//! ## Unmarked types
//!
//! Types without the component marker can still be described with [ComponentType::unmarked] or
//! made discoverable with `#[derive(Discoverable)]`. Registering them is a no-op.

use crate::error::ArgumentError;
use crate::instance_provider::{
    cast, CastFunction, ComponentInstanceAnyPtr, ComponentInstancePtr, ErrorPtr,
};
use derivative::Derivative;
use std::any::{type_name, Any, TypeId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Marker trait for injectable types - components and aliases.
pub trait Injectable: 'static {
    /// Returns the component type to register when this type is requested as an unqualified
    /// dependency and no instance exists yet. Aliases have none.
    fn registrable() -> Option<ComponentType> {
        None
    }
}

/// Base trait for components for dependency injection. Typically derived with
/// `#[derive(Component)]` or generated by `#[component]`. Please see the module-level
/// documentation for more information.
pub trait Component: Injectable + Send + Sync + Sized {
    /// Returns the description of this component type, including its markers and factories.
    fn component_type() -> ComponentType;
}

/// Identity of a type, which can be used for lookups in a registry.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Function building a type-erased instance from resolved constructor arguments.
pub type ConstructorFunction =
    fn(arguments: ConstructorArguments) -> Result<ComponentInstanceAnyPtr, ErrorPtr>;

/// Function invoking a post-construction hook on a type-erased instance.
pub type PostConstructFunction = fn(instance: &ComponentInstanceAnyPtr) -> Result<(), ErrorPtr>;

/// Description of a single constructor parameter.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ParameterDefinition {
    /// Declared type of the dependency.
    pub key: TypeKey,

    /// Optional name of the component type which should be injected.
    pub qualifier: Option<&'static str>,

    #[derivative(Debug = "ignore")]
    pub registrable: fn() -> Option<ComponentType>,
}

impl ParameterDefinition {
    pub fn of<T: Injectable + ?Sized>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            qualifier: None,
            registrable: <T as Injectable>::registrable,
        }
    }

    pub fn qualified(mut self, qualifier: &'static str) -> Self {
        self.qualifier = Some(qualifier);
        self
    }
}

/// Description of a constructor of a component.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ConstructorDefinition {
    pub name: &'static str,

    /// Constructors marked as autowired take precedence over declaration order.
    pub is_autowired: bool,

    /// Parameters in declaration order.
    pub parameters: Vec<ParameterDefinition>,

    #[derivative(Debug = "ignore")]
    pub constructor: ConstructorFunction,
}

impl ConstructorDefinition {
    pub fn new(name: &'static str, constructor: ConstructorFunction) -> Self {
        Self {
            name,
            is_autowired: false,
            parameters: vec![],
            constructor,
        }
    }

    pub fn autowired(mut self) -> Self {
        self.is_autowired = true;
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Description of a post-construction hook.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct PostConstructDefinition {
    pub name: &'static str,

    #[derivative(Debug = "ignore")]
    pub hook: PostConstructFunction,
}

impl PostConstructDefinition {
    pub fn new(name: &'static str, hook: PostConstructFunction) -> Self {
        Self { name, hook }
    }
}

/// Description of a type which can be handed to a registry. Equality is based on the type
/// identity only.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ComponentType {
    pub key: TypeKey,

    /// Name of the type without the module path, used for qualifier matching.
    pub simple_name: &'static str,

    /// Path of the module declaring the type, used for namespace discovery.
    pub module_path: &'static str,

    /// Only types with the component marker are ever registered.
    pub is_component: bool,

    /// Constructors in declaration order.
    pub constructors: Vec<ConstructorDefinition>,

    /// Post-construction hooks in declaration order.
    pub post_construct: Vec<PostConstructDefinition>,

    /// Cast function for the concrete type. Please see the documentation for [CastFunction] for
    /// details on usage.
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

impl ComponentType {
    /// Creates a marked component description for `T` without any constructors. Names are
    /// derived from [type_name] and can be overridden with [ComponentType::with_location].
    pub fn component<T: Any + Send + Sync>() -> Self {
        Self::describe::<T>(true, cast_instance::<T>)
    }

    /// Creates a description of `T` without the component marker. Such types are never
    /// instantiated, so they don't need to be `Send + Sync`.
    pub fn unmarked<T: Any>() -> Self {
        Self::describe::<T>(false, reject_cast)
    }

    fn describe<T: Any>(is_component: bool, cast: CastFunction) -> Self {
        let key = TypeKey::of::<T>();
        let (module_path, simple_name) = split_type_name(key.type_name);

        Self {
            key,
            simple_name,
            module_path,
            is_component,
            constructors: vec![],
            post_construct: vec![],
            cast,
        }
    }

    pub fn with_location(mut self, simple_name: &'static str, module_path: &'static str) -> Self {
        self.simple_name = simple_name;
        self.module_path = module_path;
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDefinition) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_post_construct(mut self, hook: PostConstructDefinition) -> Self {
        self.post_construct.push(hook);
        self
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.key.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.key.type_name
    }

    /// Full path consisting of the module path and the simple name.
    pub fn path(&self) -> String {
        if self.module_path.is_empty() {
            self.simple_name.to_string()
        } else {
            format!("{}::{}", self.module_path, self.simple_name)
        }
    }

    /// The constructor marked as autowired, or the first declared one.
    pub fn selected_constructor(&self) -> Option<&ConstructorDefinition> {
        self.constructors
            .iter()
            .find(|constructor| constructor.is_autowired)
            .or_else(|| self.constructors.first())
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

fn split_type_name(type_name: &'static str) -> (&'static str, &'static str) {
    let path = type_name.split('<').next().unwrap_or(type_name);
    match path.rfind("::") {
        Some(index) => (&path[..index], &path[index + 2..]),
        None => ("", path),
    }
}

/// Resolved dependencies passed to a [ConstructorFunction], in parameter declaration order.
pub struct ConstructorArguments {
    arguments: std::vec::IntoIter<(ComponentInstanceAnyPtr, CastFunction)>,
    index: usize,
}

impl ConstructorArguments {
    pub fn new(arguments: Vec<(ComponentInstanceAnyPtr, CastFunction)>) -> Self {
        Self {
            arguments: arguments.into_iter(),
            index: 0,
        }
    }

    /// Takes the next argument and casts it to the requested pointer type.
    pub fn take<T: Injectable + ?Sized>(&mut self) -> Result<ComponentInstancePtr<T>, ErrorPtr> {
        let index = self.index;
        self.index += 1;

        let argument = self.arguments.next().ok_or(ArgumentError::Missing {
            index,
            type_name: type_name::<T>(),
        })?;

        cast::<T>(argument).map_err(|_| {
            ArgumentError::Incompatible {
                index,
                type_name: type_name::<T>(),
            }
            .into()
        })
    }

    /// Verifies all arguments have been consumed.
    pub fn finish(self) -> Result<(), ErrorPtr> {
        match self.arguments.len() {
            0 => Ok(()),
            count => Err(ArgumentError::Unused { count }.into()),
        }
    }
}

impl From<ArgumentError> for ErrorPtr {
    fn from(value: ArgumentError) -> Self {
        Arc::new(value)
    }
}

/// Normalizes values returned by post-construction hooks.
pub trait PostConstructResult {
    fn into_hook_result(self) -> Result<(), ErrorPtr>;
}

impl PostConstructResult for () {
    #[inline]
    fn into_hook_result(self) -> Result<(), ErrorPtr> {
        Ok(())
    }
}

impl<E: Into<Box<dyn Error + Send + Sync>>> PostConstructResult for Result<(), E> {
    #[inline]
    fn into_hook_result(self) -> Result<(), ErrorPtr> {
        self.map_err(into_error_ptr)
    }
}

/// Converts any error-like value into an [ErrorPtr].
pub fn into_error_ptr<E: Into<Box<dyn Error + Send + Sync>>>(error: E) -> ErrorPtr {
    Arc::from(error.into())
}

/// [CastFunction] for concrete component types.
pub fn cast_instance<T: Any + Send + Sync>(
    instance: ComponentInstanceAnyPtr,
) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    instance
        .downcast::<T>()
        .map(|instance| Box::new(instance) as Box<dyn Any>)
}

fn reject_cast(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    Err(instance)
}

/// Borrows the concrete component from a type-erased instance.
pub fn instance_ref<T: Any + Send + Sync>(
    instance: &ComponentInstanceAnyPtr,
) -> Result<&T, ErrorPtr> {
    instance.downcast_ref::<T>().ok_or_else(|| {
        into_error_ptr(format!(
            "Instance is not of the expected type: {}",
            type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use crate::component::{
        cast_instance, instance_ref, ComponentType, ConstructorArguments, ConstructorDefinition,
        Injectable, PostConstructResult,
    };
    use crate::error::ArgumentError;
    use crate::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstancePtr, ErrorPtr,
    };
    use std::rc::Rc;

    struct TestComponent;

    impl Injectable for TestComponent {}

    struct OtherComponent;

    impl Injectable for OtherComponent {}

    fn constructor(_arguments: ConstructorArguments) -> Result<ComponentInstanceAnyPtr, ErrorPtr> {
        Ok(ComponentInstancePtr::new(TestComponent) as ComponentInstanceAnyPtr)
    }

    fn argument() -> (ComponentInstanceAnyPtr, CastFunction) {
        (
            ComponentInstancePtr::new(TestComponent) as ComponentInstanceAnyPtr,
            cast_instance::<TestComponent>,
        )
    }

    #[test]
    fn should_derive_names_from_type_name() {
        let component_type = ComponentType::component::<TestComponent>();
        assert_eq!(component_type.simple_name, "TestComponent");
        assert_eq!(component_type.module_path, module_path!());
        assert_eq!(
            component_type.path(),
            format!("{}::TestComponent", module_path!())
        );
        assert!(component_type.is_component);
        assert!(!ComponentType::unmarked::<TestComponent>().is_component);
    }

    #[test]
    fn should_describe_unmarked_type_without_thread_safety() {
        struct LocalOnly(#[allow(dead_code)] Rc<String>);

        let component_type = ComponentType::unmarked::<LocalOnly>();
        assert!(!component_type.is_component);
        assert_eq!(component_type.simple_name, "LocalOnly");

        let instance = ComponentInstancePtr::new(TestComponent) as ComponentInstanceAnyPtr;
        assert!((component_type.cast)(instance).is_err());
    }

    #[test]
    fn should_select_autowired_constructor() {
        let component_type = ComponentType::component::<TestComponent>()
            .with_constructor(ConstructorDefinition::new("first", constructor))
            .with_constructor(ConstructorDefinition::new("second", constructor).autowired());

        assert_eq!(component_type.selected_constructor().unwrap().name, "second");
    }

    #[test]
    fn should_select_first_declared_constructor() {
        let component_type = ComponentType::component::<TestComponent>()
            .with_constructor(ConstructorDefinition::new("first", constructor))
            .with_constructor(ConstructorDefinition::new("second", constructor));

        assert_eq!(component_type.selected_constructor().unwrap().name, "first");
        assert!(ComponentType::component::<TestComponent>()
            .selected_constructor()
            .is_none());
    }

    #[test]
    fn should_compare_by_type_identity() {
        assert_eq!(
            ComponentType::component::<TestComponent>(),
            ComponentType::unmarked::<TestComponent>()
        );
        assert_ne!(
            ComponentType::component::<TestComponent>(),
            ComponentType::component::<OtherComponent>()
        );
    }

    #[test]
    fn should_take_arguments_in_order() {
        let mut arguments = ConstructorArguments::new(vec![argument()]);
        assert!(arguments.take::<TestComponent>().is_ok());
        assert!(arguments.finish().is_ok());
    }

    #[test]
    fn should_report_missing_argument() {
        let mut arguments = ConstructorArguments::new(vec![]);
        let error = arguments.take::<TestComponent>().err().unwrap();
        assert!(error.to_string().contains("Missing constructor argument #0"));
    }

    #[test]
    fn should_report_incompatible_argument() {
        let mut arguments = ConstructorArguments::new(vec![argument()]);
        let error = arguments.take::<OtherComponent>().err().unwrap();
        assert_eq!(
            error.to_string(),
            ArgumentError::Incompatible {
                index: 0,
                type_name: std::any::type_name::<OtherComponent>(),
            }
            .to_string()
        );
    }

    #[test]
    fn should_report_unused_arguments() {
        let arguments = ConstructorArguments::new(vec![argument(), argument()]);
        assert!(arguments.finish().is_err());
    }

    #[test]
    fn should_normalize_hook_results() {
        assert!(().into_hook_result().is_ok());
        assert!(Ok::<(), String>(()).into_hook_result().is_ok());
        assert_eq!(
            Err::<(), _>("broken").into_hook_result().unwrap_err().to_string(),
            "broken"
        );
    }

    #[test]
    fn should_borrow_concrete_instance() {
        let (instance, _) = argument();
        assert!(instance_ref::<TestComponent>(&instance).is_ok());
        assert!(instance_ref::<OtherComponent>(&instance).is_err());
    }
}
