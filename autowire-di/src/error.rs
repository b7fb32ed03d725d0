use crate::instance_provider::ErrorPtr;
use thiserror::Error;

/// Errors related to registering and resolving components.
#[derive(Error, Clone, Debug)]
pub enum ComponentRegistryError {
    #[error("Circular dependency detected while registering component: {0}")]
    CircularDependency(String),
    #[error("Failed to construct component {type_name}: {error}")]
    ComponentConstruction {
        type_name: String,
        #[source]
        error: ErrorPtr,
    },
    #[error("Post-construction hook {type_name}::{method} failed: {error}")]
    PostConstructHook {
        type_name: String,
        method: String,
        #[source]
        error: ErrorPtr,
    },
    #[error("Cannot find registered dependency of type {type_name} qualified as '{qualifier}'")]
    DependencyNotFound {
        type_name: String,
        qualifier: String,
    },
    #[error("Cannot find an instance of type: {0}")]
    InstanceNotFound(String),
    #[error("Ambiguous dependency of type {type_name} - candidates: {}", .candidates.join(", "))]
    AmbiguousDependency {
        type_name: String,
        candidates: Vec<String>,
    },
    #[error("Tried to cast component to incompatible type: {0}")]
    IncompatibleCast(String),
}

/// Errors produced while feeding resolved dependencies into a component constructor.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ArgumentError {
    #[error("Missing constructor argument #{index} of type {type_name}")]
    Missing {
        index: usize,
        type_name: &'static str,
    },
    #[error("Constructor argument #{index} is not compatible with type {type_name}")]
    Incompatible {
        index: usize,
        type_name: &'static str,
    },
    #[error("Constructor received {count} unused argument(s)")]
    Unused { count: usize },
}

/// Errors related to discovering components in a namespace.
#[derive(Error, Clone, Debug)]
pub enum DiscoveryError {
    #[error("Cannot enumerate namespace '{namespace}': {reason}")]
    NamespaceEnumeration { namespace: String, reason: String },
    #[error("Cannot load type {path}: {error}")]
    TypeLoad {
        path: String,
        #[source]
        error: ErrorPtr,
    },
    #[error("Error registering discovered component: {0}")]
    Registration(#[from] ComponentRegistryError),
}
