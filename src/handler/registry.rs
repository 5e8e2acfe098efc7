//! Service registry for dispatching requests by `Service.Method` name.
//!
//! Registration is insert-once: a second service with the same name is
//! rejected. Lookups take a shared read lock and clone out `Arc`s, so
//! handler tasks never hold the lock while a method runs.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::service::{MethodType, RpcService, Service};
use crate::error::{Result, RpcError};

/// Registry mapping service names to services.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<Service>>>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an owned receiver.
    pub fn register<S: RpcService>(&self, receiver: S) -> Result<()> {
        self.add(Service::new(receiver))
    }

    /// Register a shared receiver.
    pub fn register_arc<S: RpcService>(&self, receiver: Arc<S>) -> Result<()> {
        self.add(Service::from_arc(receiver))
    }

    /// Insert a built service if its name is free.
    pub fn add(&self, service: Service) -> Result<()> {
        let mut services = self.services.write();
        match services.entry(service.name().to_string()) {
            Entry::Occupied(e) => Err(RpcError::DuplicateService(e.key().clone())),
            Entry::Vacant(e) => {
                tracing::debug!(
                    "rpc server: registered service {} with {} methods",
                    service.name(),
                    service.method_count()
                );
                e.insert(Arc::new(service));
                Ok(())
            }
        }
    }

    /// Resolve `Service.Method`, splitting on the last `.`.
    pub fn lookup(&self, service_method: &str) -> Result<(Arc<Service>, Arc<MethodType>)> {
        let (service_name, method_name) = service_method
            .rsplit_once('.')
            .ok_or_else(|| RpcError::MalformedServiceMethod(service_method.to_string()))?;

        let service = self
            .services
            .read()
            .get(service_name)
            .cloned()
            .ok_or_else(|| RpcError::ServiceNotFound(service_name.to_string()))?;

        let method = service
            .method(method_name)
            .ok_or_else(|| RpcError::MethodNotFound(method_name.to_string()))?;

        Ok((service, method))
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Check if no service is registered.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}
