//! A dependency injection container based on constructor autowiring, singleton instances and
//! automatic component discovery.
//!
//! Types become [components](component::Component) by deriving or declaring the component marker.
//! The [ComponentRegistry](component_registry::ComponentRegistry) then builds every component
//! exactly once, resolving constructor parameters depth-first, running post-construction hooks and
//! notifying [listeners](listener::ComponentListener). Components can also be discovered by
//! [scanning](scanner) a module namespace, instead of registering each one by hand.
//!
//! ### Simple usage example
//!
//! ```
//! use autowire_di::component_registry::ComponentRegistry;
//! use autowire_di::instance_provider::{ComponentInstancePtr, TypedComponentInstanceProvider};
//! use autowire_di::Component;
//!
//! #[derive(Component)]
//! struct Dependency;
//!
//! #[derive(Component)]
//! struct Service {
//!     dependency: ComponentInstancePtr<Dependency>,
//! }
//!
//! let mut registry = ComponentRegistry::new();
//!
//! // Dependency gets registered transitively
//! registry.register_typed::<Service>().unwrap();
//!
//! assert!(registry.resolve_typed::<Dependency>().is_ok());
//! assert!(registry.resolve_typed::<Service>().is_ok());
//! ```
//!
//! ### Features
//!
//! * `derive` - enable the procedural macros declaring components, constructors, hooks and aliases

pub mod component;
pub mod component_registry;
mod error;
pub mod instance_provider;
pub mod listener;
pub mod scanner;

pub use error::{ArgumentError, ComponentRegistryError, DiscoveryError};

#[cfg(feature = "derive")]
pub use autowire_di_derive::{component, component_alias, injectable, Component, Discoverable};
