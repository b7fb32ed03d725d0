//! Container facade based on [autowire_di] dependency injection.
//!
//! Components declared with `autowire_di` can be registered one by one, or discovered in bulk by
//! scanning a module namespace. This crate wraps a
//! [ComponentRegistry](autowire_di::component_registry::ComponentRegistry) in a
//! [Container](container::Container), which can discover components lazily on first access, and
//! configures additional supporting infrastructure, e.g. logging.
//!
//! ```
//! use autowire::container::ContainerBuilder;
//! use autowire::config::ContainerConfig;
//! use autowire_di::instance_provider::ComponentInstancePtr;
//!
//! mod components {
//!     use autowire_di::instance_provider::ComponentInstancePtr;
//!     use autowire_di::Component;
//!
//!     pub const NAMESPACE: &str = module_path!();
//!
//!     #[derive(Component)]
//!     pub struct Repository;
//!
//!     #[derive(Component)]
//!     pub struct Service {
//!         pub repository: ComponentInstancePtr<Repository>,
//!     }
//! }
//!
//! let config = ContainerConfig::default()
//!     .with_root_namespace(components::NAMESPACE)
//!     .with_discover_on_first_access(true)
//!     .with_install_tracing_logger(false);
//!
//! let container = ContainerBuilder::new().with_config(config).build().unwrap();
//!
//! // the first access discovers both components
//! let service = container.get_bean::<components::Service>().unwrap();
//! let repository = container.get_bean::<components::Repository>().unwrap();
//! assert!(ComponentInstancePtr::ptr_eq(&service.repository, &repository));
//! ```

pub mod config;
pub mod container;
