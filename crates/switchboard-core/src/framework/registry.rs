//! Handler registry.
//!
//! The registry maps method names to [`HandlerDescriptor`]s. It is built once at
//! startup with [`Registry::register`] and only read afterwards; there is no
//! API to add or remove handlers while serving.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::handler::HandlerDescriptor;
use crate::foundation::{DispatchError, DispatchResult, RegistryError, RegistryResult};

/// Immutable method → descriptor mapping.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    handlers: BTreeMap<String, Arc<HandlerDescriptor>>,
}

impl Registry {
    /// Builds a registry from the full set of handlers.
    ///
    /// Either every descriptor is installed or none is: a duplicate or empty
    /// name fails the whole call.
    pub fn register(
        handlers: impl IntoIterator<Item = HandlerDescriptor>,
    ) -> RegistryResult<Self> {
        let mut map = BTreeMap::new();
        for descriptor in handlers {
            if descriptor.name().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            let name = descriptor.name().to_string();
            if map.contains_key(&name) {
                return Err(RegistryError::Duplicate(name));
            }
            debug!(
                method = %name,
                middlewares = descriptor.local_middlewares().len(),
                "Registered handler"
            );
            map.insert(name, Arc::new(descriptor));
        }
        Ok(Self { handlers: map })
    }

    /// Looks up `method` by exact match.
    pub fn lookup(&self, method: &str) -> DispatchResult<&Arc<HandlerDescriptor>> {
        self.handlers
            .get(method)
            .ok_or_else(|| DispatchError::not_found(method))
    }

    /// Whether `method` is registered.
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Iterates descriptors in method-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<HandlerDescriptor>> {
        self.handlers.values()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
