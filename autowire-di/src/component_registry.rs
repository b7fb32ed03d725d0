//! The [ComponentRegistry] owns a single shared instance of every registered component and
//! implements the resolution algorithm.
//!
//! Registering a type resolves its selected constructor's parameters depth-first, registering
//! unqualified dependencies on demand, then constructs, caches and initializes the instance.
//! Qualified dependencies are only searched among already registered instances, so every
//! candidate of a qualified parameter needs to be registered before its dependents.
//!
//! The registry is single-threaded by contract - every mutating operation requires `&mut self`.
//! Wrap it in a lock when sharing between threads, as the `autowire` container does.

use crate::component::{Component, ComponentType, ConstructorArguments, ParameterDefinition, TypeKey};
use crate::component_registry::internal::ComponentAliasRegisterer;
use crate::error::ComponentRegistryError;
use crate::instance_provider::{
    CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider,
};
use crate::listener::{ComponentListener, ComponentListenerPtr};
use definition::{ComponentAliasMetadata, RegisteredComponent};
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use std::any::TypeId;
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

pub use definition::ComponentAliasDefinition;

/// Registry of singleton component instances. See module documentation for the registration
/// algorithm.
pub struct ComponentRegistry {
    instances: FxHashMap<TypeId, RegisteredComponent>,
    // makes "first match" lookups deterministic
    registration_order: Vec<TypeId>,
    types_under_construction: FxHashSet<TypeId>,
    aliases: FxHashMap<TypeId, Vec<ComponentAliasMetadata>>,
    pre_add_listeners: Vec<ComponentListenerPtr>,
    post_add_listeners: Vec<ComponentListenerPtr>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Creates a new registry with all aliases declared via `#[component_alias]`.
    pub fn new() -> Self {
        let mut registry = Self::without_aliases();

        for definition in inventory::iter::<ComponentAliasRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
        {
            registry.register_alias(definition);
        }

        registry
    }

    /// Creates a new registry without any aliases - they can be registered manually with
    /// [ComponentRegistry::register_alias].
    pub fn without_aliases() -> Self {
        Self {
            instances: Default::default(),
            registration_order: Default::default(),
            types_under_construction: Default::default(),
            aliases: Default::default(),
            pre_add_listeners: Default::default(),
            post_add_listeners: Default::default(),
        }
    }

    /// Makes the `target` component type assignable to the `alias` type.
    pub fn register_alias(&mut self, definition: ComponentAliasDefinition) {
        let aliases = self.aliases.entry(definition.target.type_id).or_default();
        if aliases
            .iter()
            .all(|alias| alias.alias != definition.alias)
        {
            aliases.push(ComponentAliasMetadata {
                alias: definition.alias,
                cast: definition.cast,
            });
        }
    }

    /// Appends a listener called before a component gets constructed.
    pub fn add_pre_add_listener<L: ComponentListener + Send + Sync + 'static>(
        &mut self,
        listener: L,
    ) {
        self.pre_add_listeners.push(Box::new(listener));
    }

    /// Appends a listener called after a component has been constructed and initialized.
    pub fn add_post_add_listener<L: ComponentListener + Send + Sync + 'static>(
        &mut self,
        listener: L,
    ) {
        self.post_add_listeners.push(Box::new(listener));
    }

    /// Typesafe version of [ComponentRegistry::register].
    #[inline]
    pub fn register_typed<T: Component>(&mut self) -> Result<(), ComponentRegistryError> {
        self.register(&T::component_type())
    }

    /// Creates and stores the single instance of the given type, along with all its unqualified
    /// dependencies. Registering an already registered type or a type without the component
    /// marker is a no-op.
    pub fn register(&mut self, component_type: &ComponentType) -> Result<(), ComponentRegistryError> {
        let type_id = component_type.type_id();
        if self.instances.contains_key(&type_id) {
            return Ok(());
        }

        if !component_type.is_component {
            trace!(
                component = component_type.type_name(),
                "Skipping type without component marker."
            );
            return Ok(());
        }

        if self.types_under_construction.contains(&type_id) {
            return Err(ComponentRegistryError::CircularDependency(
                component_type.type_name().to_string(),
            ));
        }

        ConstructionGuard::new(self, type_id).create_component(component_type)
    }

    /// Checks if given type has a registered instance.
    #[inline]
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.instances.contains_key(&type_id)
    }

    /// Typesafe version of [ComponentRegistry::is_registered].
    #[inline]
    pub fn is_registered_typed<T: Component>(&self) -> bool {
        self.is_registered(TypeId::of::<T>())
    }

    /// Returns types of all registered components, in registration order.
    pub fn registered_types(&self) -> impl Iterator<Item = &ComponentType> {
        self.registration_order
            .iter()
            .filter_map(move |type_id| self.instances.get(type_id))
            .map(|registered| &registered.component_type)
    }

    /// Number of registered components.
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Checks if no component has been registered yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn create_component(&mut self, component_type: &ComponentType) -> Result<(), ComponentRegistryError> {
        debug!(component = component_type.type_name(), "Registering component.");

        for listener in &self.pre_add_listeners {
            listener.on_component_added(component_type);
        }

        let constructor = component_type.selected_constructor().ok_or_else(|| {
            ComponentRegistryError::ComponentConstruction {
                type_name: component_type.type_name().to_string(),
                error: crate::component::into_error_ptr("No constructor declared"),
            }
        })?;

        trace!(
            component = component_type.type_name(),
            constructor = constructor.name,
            "Resolving constructor parameters."
        );

        let arguments = constructor
            .parameters
            .iter()
            .map(|parameter| self.resolve_parameter(parameter))
            .collect::<Result<Vec<_>, _>>()?;

        let instance = (constructor.constructor)(ConstructorArguments::new(arguments)).map_err(
            |error| ComponentRegistryError::ComponentConstruction {
                type_name: component_type.type_name().to_string(),
                error,
            },
        )?;

        self.store_instance(component_type, instance.clone());

        for hook in &component_type.post_construct {
            if let Err(error) = (hook.hook)(&instance) {
                self.evict_instance(component_type.type_id());
                return Err(ComponentRegistryError::PostConstructHook {
                    type_name: component_type.type_name().to_string(),
                    method: hook.name.to_string(),
                    error,
                });
            }
        }

        for listener in &self.post_add_listeners {
            listener.on_component_added(component_type);
        }

        debug!(component = component_type.type_name(), "Registered component.");

        Ok(())
    }

    fn resolve_parameter(
        &mut self,
        parameter: &ParameterDefinition,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError> {
        if let Some(qualifier) = parameter.qualifier {
            return self.resolve_qualified(parameter.key, qualifier);
        }

        if !self.instances.contains_key(&parameter.key.type_id) {
            if let Some(dependency) = (parameter.registrable)() {
                trace!(
                    dependency = parameter.key.type_name,
                    "Registering dependency on demand."
                );
                self.register(&dependency)?;
            }
        }

        self.resolve(parameter.key)
    }

    fn store_instance(&mut self, component_type: &ComponentType, instance: ComponentInstanceAnyPtr) {
        let type_id = component_type.type_id();
        self.instances.insert(
            type_id,
            RegisteredComponent {
                component_type: component_type.clone(),
                instance,
            },
        );
        self.registration_order.push(type_id);
    }

    fn evict_instance(&mut self, type_id: TypeId) {
        self.instances.remove(&type_id);
        self.registration_order.retain(|registered| *registered != type_id);
    }

    fn cast_function(&self, registered: &RegisteredComponent, type_id: TypeId) -> Option<CastFunction> {
        if registered.component_type.type_id() == type_id {
            return Some(registered.component_type.cast);
        }

        self.aliases
            .get(&registered.component_type.type_id())
            .and_then(|aliases| aliases.iter().find(|alias| alias.alias.type_id == type_id))
            .map(|alias| alias.cast)
    }

    fn assignable_instances(
        &self,
        type_id: TypeId,
    ) -> impl Iterator<Item = (&RegisteredComponent, CastFunction)> {
        self.registration_order
            .iter()
            .filter_map(move |registered| self.instances.get(registered))
            .filter_map(move |registered| {
                self.cast_function(registered, type_id)
                    .map(|cast| (registered, cast))
            })
    }
}

impl ComponentInstanceProvider for ComponentRegistry {
    fn resolve(
        &self,
        key: TypeKey,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError> {
        if let Some(registered) = self.instances.get(&key.type_id) {
            return Ok((registered.instance.clone(), registered.component_type.cast));
        }

        // aliases can be resolved without a qualifier only when unambiguous
        let candidates = self.assignable_instances(key.type_id).collect_vec();
        match candidates.as_slice() {
            [] => Err(ComponentRegistryError::InstanceNotFound(
                key.type_name.to_string(),
            )),
            [(registered, cast)] => Ok((registered.instance.clone(), *cast)),
            _ => Err(ComponentRegistryError::AmbiguousDependency {
                type_name: key.type_name.to_string(),
                candidates: candidates
                    .iter()
                    .map(|(registered, _)| registered.component_type.simple_name.to_string())
                    .collect(),
            }),
        }
    }

    fn resolve_qualified(
        &self,
        key: TypeKey,
        qualifier: &str,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError> {
        self.assignable_instances(key.type_id)
            .find(|(registered, _)| registered.component_type.simple_name == qualifier)
            .map(|(registered, cast)| (registered.instance.clone(), cast))
            .ok_or_else(|| ComponentRegistryError::DependencyNotFound {
                type_name: key.type_name.to_string(),
                qualifier: qualifier.to_string(),
            })
    }
}

mod definition {
    use crate::component::{ComponentType, TypeKey};
    use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr};
    use derivative::Derivative;

    /// Makes instances of the `target` component type available as the `alias` type, typically
    /// a `dyn Trait`.
    #[derive(Derivative, Clone, Copy)]
    #[derivative(Debug)]
    pub struct ComponentAliasDefinition {
        pub alias: TypeKey,
        pub target: TypeKey,

        /// Cast function converting a `target` instance to an `alias` pointer.
        #[derivative(Debug = "ignore")]
        pub cast: CastFunction,
    }

    #[derive(Clone, Copy)]
    pub(super) struct ComponentAliasMetadata {
        pub(super) alias: TypeKey,
        pub(super) cast: CastFunction,
    }

    pub(super) struct RegisteredComponent {
        pub(super) component_type: ComponentType,
        pub(super) instance: ComponentInstanceAnyPtr,
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::component::ComponentType;
    use crate::component_registry::ComponentAliasDefinition;
    use inventory::collect;
    pub use inventory::submit;

    /// Statically submitted type, which can be found by namespace discovery.
    pub struct ComponentRegisterer {
        pub module_path: &'static str,
        pub name: &'static str,
        pub register: fn() -> ComponentType,
    }

    pub struct ComponentAliasRegisterer {
        pub register: fn() -> ComponentAliasDefinition,
    }

    collect!(ComponentRegisterer);
    collect!(ComponentAliasRegisterer);
}

// Keeps a type marked as under construction until dropped, which also happens when a
// constructor, hook or listener unwinds.
struct ConstructionGuard<'a> {
    registry: &'a mut ComponentRegistry,
    type_id: TypeId,
}

impl<'a> ConstructionGuard<'a> {
    fn new(registry: &'a mut ComponentRegistry, type_id: TypeId) -> Self {
        registry.types_under_construction.insert(type_id);
        Self { registry, type_id }
    }
}

impl Deref for ConstructionGuard<'_> {
    type Target = ComponentRegistry;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl DerefMut for ConstructionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        self.registry.types_under_construction.remove(&self.type_id);
    }
}
