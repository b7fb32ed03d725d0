//! Observers notified about component registration. Listeners are called in the order they were
//! added, never removed, and can be plain closures:
//!
//! ```
//! use autowire_di::component::ComponentType;
//! use autowire_di::component_registry::ComponentRegistry;
//!
//! let mut registry = ComponentRegistry::new();
//! registry.add_post_add_listener(|component_type: &ComponentType| {
//!     println!("Component added: {}", component_type.simple_name);
//! });
//! ```

use crate::component::ComponentType;
#[cfg(test)]
use mockall::automock;

pub type ComponentListenerPtr = Box<dyn ComponentListener + Send + Sync>;

/// Callback invoked with the type being registered.
#[cfg_attr(test, automock)]
pub trait ComponentListener {
    fn on_component_added(&self, component_type: &ComponentType);
}

impl<F: Fn(&ComponentType)> ComponentListener for F {
    #[inline]
    fn on_component_added(&self, component_type: &ComponentType) {
        self(component_type)
    }
}
