//! Namespace-driven discovery of component types.
//!
//! A [TypeLoader] enumerates every known type whose module path lies under a given [Namespace],
//! and the [ComponentScanner] hands each of them to a
//! [ComponentRegistry](crate::component_registry::ComponentRegistry). Types without the component
//! marker are visited, but never registered.
//!
//! The default loader is the [StaticTypeLoader], which sees every type declared with
//! `#[derive(Component)]`, `#[component]` or `#[derive(Discoverable)]` anywhere in the final
//! binary:
//!
//! ```
//! use autowire_di::component_registry::ComponentRegistry;
//! use autowire_di::instance_provider::TypedComponentInstanceProvider;
//! use autowire_di::scanner::{ComponentScanner, StaticTypeLoader};
//! use autowire_di::Component;
//!
//! mod services {
//!     use autowire_di::Component;
//!
//!     pub const NAMESPACE: &str = module_path!();
//!
//!     #[derive(Component)]
//!     pub struct UserService;
//! }
//!
//! #[derive(Component)]
//! struct Unrelated;
//!
//! let mut registry = ComponentRegistry::new();
//! ComponentScanner::scan(&mut registry, services::NAMESPACE, &StaticTypeLoader).unwrap();
//!
//! assert!(registry.resolve_typed::<services::UserService>().is_ok());
//! assert!(registry.resolve_typed::<Unrelated>().is_err());
//! ```

use crate::component::{Component, ComponentType};
use crate::component_registry::internal::ComponentRegisterer;
use crate::component_registry::ComponentRegistry;
use crate::error::DiscoveryError;
use crate::instance_provider::ErrorPtr;
use derivative::Derivative;
#[cfg(test)]
use mockall::automock;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

/// Root of a type search - a module path, such as `app::services`. Segments can also be separated
/// with dots. The empty namespace contains all types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// Namespace containing all types.
    pub fn all() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_all(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Checks if given module path is this namespace or any of its sub-namespaces.
    pub fn contains_module(&self, module_path: &str) -> bool {
        let mut module_segments = module_path.split("::");
        self.segments
            .iter()
            .all(|segment| module_segments.next() == Some(segment.as_str()))
    }
}

impl FromStr for Namespace {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::all());
        }

        let segments = trimmed
            .split("::")
            .flat_map(|segment| segment.split('.'))
            .map(|segment| {
                if is_identifier(segment) {
                    Ok(segment.to_string())
                } else {
                    Err(DiscoveryError::NamespaceEnumeration {
                        namespace: s.to_string(),
                        reason: format!("'{segment}' is not a valid identifier"),
                    })
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { segments })
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            segment != "_" && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub type TypeLoadFunction = Arc<dyn Fn() -> Result<ComponentType, ErrorPtr> + Send + Sync>;

/// A type found during enumeration, which still needs to be loaded.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct TypeEntry {
    pub module_path: String,
    pub name: String,

    #[derivative(Debug = "ignore")]
    load: TypeLoadFunction,
}

impl TypeEntry {
    pub fn new<F>(module_path: impl Into<String>, name: impl Into<String>, load: F) -> Self
    where
        F: Fn() -> Result<ComponentType, ErrorPtr> + Send + Sync + 'static,
    {
        Self {
            module_path: module_path.into(),
            name: name.into(),
            load: Arc::new(load),
        }
    }

    /// Creates an entry for an already known type, located where the type itself says.
    pub fn from_type(component_type: ComponentType) -> Self {
        Self {
            module_path: component_type.module_path.to_string(),
            name: component_type.simple_name.to_string(),
            load: Arc::new(move || Ok(component_type.clone())),
        }
    }

    /// Full type path.
    pub fn path(&self) -> String {
        if self.module_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module_path, self.name)
        }
    }

    pub fn load(&self) -> Result<ComponentType, ErrorPtr> {
        (self.load)()
    }
}

/// Context able to enumerate and load types by namespace.
#[cfg_attr(test, automock)]
pub trait TypeLoader {
    /// Returns all types in the given namespace and its sub-namespaces, in no particular order.
    fn entries(&self, namespace: &Namespace) -> Result<Vec<TypeEntry>, DiscoveryError>;
}

/// Loader for all types submitted at compile time by the derive macros.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticTypeLoader;

impl TypeLoader for StaticTypeLoader {
    fn entries(&self, namespace: &Namespace) -> Result<Vec<TypeEntry>, DiscoveryError> {
        Ok(inventory::iter::<ComponentRegisterer>
            .into_iter()
            .filter(|registerer| namespace.contains_module(registerer.module_path))
            .map(|registerer| {
                let register = registerer.register;
                TypeEntry::new(registerer.module_path, registerer.name, move || {
                    Ok(register())
                })
            })
            .collect())
    }
}

/// Manually maintained table of types.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component<T: Component>(self) -> Self {
        self.with_type(T::component_type())
    }

    pub fn with_type(self, component_type: ComponentType) -> Self {
        self.with_entry(TypeEntry::from_type(component_type))
    }

    pub fn with_entry(mut self, entry: TypeEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TypeLoader for TypeTable {
    fn entries(&self, namespace: &Namespace) -> Result<Vec<TypeEntry>, DiscoveryError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| namespace.contains_module(&entry.module_path))
            .cloned()
            .collect())
    }
}

/// Summary of a successful scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of types found in the namespace, including unmarked ones.
    pub visited: usize,

    /// Number of components registered by the scan, including dependencies outside the
    /// namespace.
    pub registered: usize,
}

/// Registers all component types found in a namespace.
pub struct ComponentScanner;

impl ComponentScanner {
    /// Enumerates `root` with the given loader and registers every found type, in path order. All
    /// types are loaded before registration starts, so a load error leaves the registry untouched.
    /// A registration error aborts the scan, but keeps components registered so far.
    pub fn scan<L: TypeLoader + ?Sized>(
        registry: &mut ComponentRegistry,
        root: &str,
        loader: &L,
    ) -> Result<ScanReport, DiscoveryError> {
        let namespace: Namespace = root.parse()?;
        debug!(%namespace, "Scanning namespace for components.");

        let mut entries = loader.entries(&namespace)?;
        entries.sort_by_cached_key(TypeEntry::path);

        let component_types = entries
            .iter()
            .map(|entry| {
                trace!(path = %entry.path(), "Loading type.");
                entry.load().map_err(|error| DiscoveryError::TypeLoad {
                    path: entry.path(),
                    error,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let registered_before = registry.len();
        for component_type in &component_types {
            registry.register(component_type)?;
        }

        let report = ScanReport {
            visited: component_types.len(),
            registered: registry.len() - registered_before,
        };

        debug!(
            %namespace,
            visited = report.visited,
            registered = report.registered,
            "Finished scanning namespace."
        );

        Ok(report)
    }
}
