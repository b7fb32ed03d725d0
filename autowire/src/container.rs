//! The [Container] is a convenience facade over a single
//! [ComponentRegistry], adding namespace discovery on demand and serialized access from multiple
//! threads.
//!
//! Containers are explicit values - create one at startup with [create_default] or a
//! [ContainerBuilder], pass it to whichever code needs it and drop it on shutdown:
//!
//! ```
//! use autowire::config::ContainerConfig;
//! use autowire::container::ContainerBuilder;
//! use autowire_di::Component;
//!
//! #[derive(Component)]
//! struct Greeter;
//!
//! let container = ContainerBuilder::new()
//!     .with_config(ContainerConfig::default().with_install_tracing_logger(false))
//!     .build()
//!     .unwrap();
//!
//! container.register_component::<Greeter>().unwrap();
//! assert!(container.get_bean::<Greeter>().is_ok());
//! ```

use crate::config::ContainerConfig;
use autowire_di::component::{Component, ComponentType, Injectable};
use autowire_di::component_registry::ComponentRegistry;
use autowire_di::instance_provider::{
    ComponentInstancePtr, ErrorPtr, TypedComponentInstanceProvider,
};
use autowire_di::listener::ComponentListener;
use autowire_di::scanner::{ComponentScanner, ScanReport, StaticTypeLoader, TypeLoader};
use autowire_di::{ComponentRegistryError, DiscoveryError};
use derive_more::Constructor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub type TypeLoaderPtr = Box<dyn TypeLoader + Send + Sync>;

#[derive(Clone, Error, Debug)]
pub enum ContainerError {
    #[error("Component registry error: {0}")]
    Registry(#[from] ComponentRegistryError),
    #[error("Component discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("Configuration error: {0}")]
    Config(ErrorPtr),
}

#[derive(Constructor)]
struct ContainerState {
    registry: ComponentRegistry,
    discovery_armed: bool,
}

/// Facade over a [ComponentRegistry]. Every operation holds an internal lock for its whole
/// duration, including the depth-first registration of dependencies.
pub struct Container {
    state: Mutex<ContainerState>,
    root_namespace: String,
    type_loader: TypeLoaderPtr,
}

impl Container {
    /// Creates a container using the [StaticTypeLoader] for discovery.
    pub fn new(registry: ComponentRegistry, config: &ContainerConfig) -> Self {
        Self::with_type_loader(registry, config, Box::new(StaticTypeLoader))
    }

    pub fn with_type_loader(
        registry: ComponentRegistry,
        config: &ContainerConfig,
        type_loader: TypeLoaderPtr,
    ) -> Self {
        Self {
            state: Mutex::new(ContainerState::new(
                registry,
                config.discover_on_first_access,
            )),
            root_namespace: config.root_namespace.clone(),
            type_loader,
        }
    }

    /// Namespace scanned when discovery is armed.
    #[inline]
    pub fn root_namespace(&self) -> &str {
        &self.root_namespace
    }

    /// Registers all components found in the given namespace.
    pub fn init(&self, root_namespace: &str) -> Result<ScanReport, ContainerError> {
        let mut state = self.state();
        self.scan(&mut state.registry, root_namespace)
    }

    /// Returns the instance of given type. Runs discovery of the root namespace first, if armed.
    pub fn get_bean<T: Injectable + ?Sized>(&self) -> Result<ComponentInstancePtr<T>, ContainerError> {
        let mut state = self.state();
        self.discover_if_armed(&mut state)?;
        state.registry.resolve_typed::<T>().map_err(Into::into)
    }

    /// Returns the registered instance assignable to given type, whose type is named like the
    /// qualifier. Runs discovery of the root namespace first, if armed.
    pub fn get_qualified_bean<T: Injectable + ?Sized>(
        &self,
        qualifier: &str,
    ) -> Result<ComponentInstancePtr<T>, ContainerError> {
        let mut state = self.state();
        self.discover_if_armed(&mut state)?;
        state
            .registry
            .resolve_qualified_typed::<T>(qualifier)
            .map_err(Into::into)
    }

    /// Registers the type of given value. Note: the value itself is not stored - the container
    /// constructs its own instance.
    pub fn register_bean<T: Component>(&self, _bean: &T) -> Result<(), ContainerError> {
        self.register_component::<T>()
    }

    pub fn register_component<T: Component>(&self) -> Result<(), ContainerError> {
        self.register_type(&T::component_type())
    }

    pub fn register_type(&self, component_type: &ComponentType) -> Result<(), ContainerError> {
        self.state()
            .registry
            .register(component_type)
            .map_err(Into::into)
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.state().registry.is_registered_typed::<T>()
    }

    pub fn add_pre_add_listener<L: ComponentListener + Send + Sync + 'static>(&self, listener: L) {
        self.state().registry.add_pre_add_listener(listener);
    }

    pub fn add_post_add_listener<L: ComponentListener + Send + Sync + 'static>(&self, listener: L) {
        self.state().registry.add_post_add_listener(listener);
    }

    /// Makes the next bean access scan the root namespace.
    pub fn arm_discovery(&self) {
        self.state().discovery_armed = true;
    }

    pub fn is_discovery_armed(&self) -> bool {
        self.state().discovery_armed
    }

    fn state(&self) -> MutexGuard<'_, ContainerState> {
        // recover from panics in user callbacks
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn discover_if_armed(&self, state: &mut ContainerState) -> Result<(), ContainerError> {
        if state.discovery_armed {
            self.scan(&mut state.registry, &self.root_namespace)?;
            state.discovery_armed = false;
        }

        Ok(())
    }

    fn scan(
        &self,
        registry: &mut ComponentRegistry,
        root_namespace: &str,
    ) -> Result<ScanReport, ContainerError> {
        info!(root_namespace, "Discovering components...");

        let report = ComponentScanner::scan(registry, root_namespace, self.type_loader.as_ref())?;

        info!(
            visited = report.visited,
            registered = report.registered,
            "Discovered components."
        );

        Ok(report)
    }
}

/// Builder for [Container]s. Uses config from the environment unless given explicitly.
pub struct ContainerBuilder {
    config: Option<ContainerConfig>,
    registry: ComponentRegistry,
    type_loader: TypeLoaderPtr,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            registry: ComponentRegistry::new(),
            type_loader: Box::new(StaticTypeLoader),
        }
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses given registry instead of a new one. Listeners added to the builder so far are
    /// discarded.
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_type_loader<L: TypeLoader + Send + Sync + 'static>(mut self, type_loader: L) -> Self {
        self.type_loader = Box::new(type_loader);
        self
    }

    pub fn with_pre_add_listener<L: ComponentListener + Send + Sync + 'static>(
        mut self,
        listener: L,
    ) -> Self {
        self.registry.add_pre_add_listener(listener);
        self
    }

    pub fn with_post_add_listener<L: ComponentListener + Send + Sync + 'static>(
        mut self,
        listener: L,
    ) -> Self {
        self.registry.add_post_add_listener(listener);
        self
    }

    pub fn build(self) -> Result<Container, ContainerError> {
        let config = match self.config {
            Some(config) => config,
            None => ContainerConfig::from_environment()
                .map_err(|error| ContainerError::Config(Arc::new(error)))?,
        };

        if config.install_tracing_logger {
            install_tracing_logger();
        }

        debug!(?config, "Building container.");

        Ok(Container::with_type_loader(
            self.registry,
            &config,
            self.type_loader,
        ))
    }
}

/// Creates a [Container] with config from the environment, discovering components with the
/// [StaticTypeLoader].
pub fn create_default() -> Result<Container, ContainerError> {
    ContainerBuilder::new().build()
}

fn install_tracing_logger() {
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        debug!(%error, "Not installing tracing logger.");
    }
}
