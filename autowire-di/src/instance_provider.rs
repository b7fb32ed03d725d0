//! Access to component instances held by a container.

use crate::component::{Injectable, TypeKey};
use crate::error::ComponentRegistryError;
use std::any::{type_name, Any};
use std::error::Error;
use std::sync::Arc;

pub type ComponentInstancePtr<T> = Arc<T>;

pub type ComponentInstanceAnyPtr = ComponentInstancePtr<dyn Any + Send + Sync + 'static>;

/// Shared error pointer used to carry failures of user code, e.g. constructors or hooks.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Casts a type-erased instance to a `Box<ComponentInstancePtr<T>>` erased as `Box<dyn Any>`,
/// where `T` is the type the function was registered for - either the concrete component type or
/// one of its aliases. Returns the original instance if the cast is not possible.
pub type CastFunction =
    fn(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr>;

/// Generic provider for component instances.
pub trait ComponentInstanceProvider {
    /// Returns the instance registered for the given type, along with a cast function appropriate
    /// for this type. Never triggers registration.
    fn resolve(
        &self,
        key: TypeKey,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError>;

    /// Returns the first registered instance assignable to the given type, whose simple declared
    /// type name equals the qualifier.
    fn resolve_qualified(
        &self,
        key: TypeKey,
        qualifier: &str,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError>;
}

/// Helper trait for [ComponentInstanceProvider] providing strongly-typed access.
pub trait TypedComponentInstanceProvider {
    /// Typesafe version of [ComponentInstanceProvider::resolve].
    fn resolve_typed<T: Injectable + ?Sized>(
        &self,
    ) -> Result<ComponentInstancePtr<T>, ComponentRegistryError>;

    /// Typesafe version of [ComponentInstanceProvider::resolve_qualified].
    fn resolve_qualified_typed<T: Injectable + ?Sized>(
        &self,
        qualifier: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentRegistryError>;

    /// Tries to get an instance like [TypedComponentInstanceProvider::resolve_typed] does, but
    /// returns `None` on missing instance.
    fn resolve_option<T: Injectable + ?Sized>(
        &self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentRegistryError>;
}

impl<CIP: ComponentInstanceProvider + ?Sized> TypedComponentInstanceProvider for CIP {
    fn resolve_typed<T: Injectable + ?Sized>(
        &self,
    ) -> Result<ComponentInstancePtr<T>, ComponentRegistryError> {
        self.resolve(TypeKey::of::<T>()).and_then(cast)
    }

    fn resolve_qualified_typed<T: Injectable + ?Sized>(
        &self,
        qualifier: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentRegistryError> {
        self.resolve_qualified(TypeKey::of::<T>(), qualifier)
            .and_then(cast)
    }

    fn resolve_option<T: Injectable + ?Sized>(
        &self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentRegistryError> {
        match self.resolve_typed::<T>() {
            Ok(instance) => Ok(Some(instance)),
            Err(ComponentRegistryError::InstanceNotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

/// Casts a type-erased instance using its [CastFunction] to a concrete pointer type.
pub fn cast<T: Injectable + ?Sized>(
    (instance, cast_function): (ComponentInstanceAnyPtr, CastFunction),
) -> Result<ComponentInstancePtr<T>, ComponentRegistryError> {
    cast_function(instance)
        .ok()
        .and_then(|instance| instance.downcast::<ComponentInstancePtr<T>>().ok())
        .map(|instance| *instance)
        .ok_or_else(|| ComponentRegistryError::IncompatibleCast(type_name::<T>().to_string()))
}

#[cfg(test)]
mod tests {
    use crate::component::{cast_instance, Injectable, TypeKey};
    use crate::error::ComponentRegistryError;
    use crate::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr,
        TypedComponentInstanceProvider,
    };

    struct TestComponent(i8);

    impl Injectable for TestComponent {}

    struct OtherComponent;

    impl Injectable for OtherComponent {}

    struct SingleInstanceProvider;

    impl ComponentInstanceProvider for SingleInstanceProvider {
        fn resolve(
            &self,
            key: TypeKey,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError> {
            if key == TypeKey::of::<TestComponent>() {
                Ok((
                    ComponentInstancePtr::new(TestComponent(5)) as ComponentInstanceAnyPtr,
                    cast_instance::<TestComponent> as CastFunction,
                ))
            } else {
                Err(ComponentRegistryError::InstanceNotFound(
                    key.type_name.to_string(),
                ))
            }
        }

        fn resolve_qualified(
            &self,
            key: TypeKey,
            qualifier: &str,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentRegistryError> {
            Err(ComponentRegistryError::DependencyNotFound {
                type_name: key.type_name.to_string(),
                qualifier: qualifier.to_string(),
            })
        }
    }

    #[test]
    fn should_cast_resolved_instance() {
        let instance = SingleInstanceProvider
            .resolve_typed::<TestComponent>()
            .unwrap();
        assert_eq!(instance.0, 5);
    }

    #[test]
    fn should_return_none_for_missing_instance() {
        assert!(SingleInstanceProvider
            .resolve_option::<OtherComponent>()
            .unwrap()
            .is_none());
    }

    #[test]
    fn should_reject_incompatible_cast() {
        let instance = ComponentInstancePtr::new(TestComponent(1)) as ComponentInstanceAnyPtr;
        assert!(matches!(
            super::cast::<OtherComponent>((instance, cast_instance::<TestComponent>)),
            Err(ComponentRegistryError::IncompatibleCast(_))
        ));
    }
}
