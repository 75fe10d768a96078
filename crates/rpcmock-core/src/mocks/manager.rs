//! Registration store for mocked RPC methods.
//!
//! This module provides `MockRegistry`, a flat map from method identity to the
//! behavior registered for it. Service-wide and single-method registrations
//! both write into the same map, so the last registration for a method wins
//! regardless of which entry point made it.

use crate::error::MockError;
use crate::router::MethodImpl;
use crate::types::descriptor::{MethodDescriptor, MethodIdentity, ServiceDescriptor};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Behavior resolved for one intercepted call
#[derive(Debug, Clone)]
pub enum Disposition {
    /// Nothing registered: let the request reach the network
    PassThrough,
    /// Answer with the output type's zero value
    Default,
    /// Answer with a caller-supplied implementation
    Custom(MethodImpl),
}

impl Disposition {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Disposition::PassThrough)
    }
}

/// Behavior bound to a single method
#[derive(Debug, Clone)]
pub enum MethodHandler {
    /// Zero-value response
    Default,
    /// Custom implementation; may fail with an `RpcError`
    Custom(MethodImpl),
}

impl MethodHandler {
    /// Custom handler from an async closure
    pub fn custom<F, Fut>(f: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<serde_json::Value, crate::router::RpcError>>
            + Send
            + 'static,
    {
        MethodHandler::Custom(MethodImpl::new(f))
    }

    fn disposition(&self) -> Disposition {
        match self {
            MethodHandler::Default => Disposition::Default,
            MethodHandler::Custom(implementation) => Disposition::Custom(implementation.clone()),
        }
    }
}

/// Behavior bound to a whole service
#[derive(Debug, Clone)]
pub enum ServiceHandler {
    /// Zero-value responses for every unary method of the service
    Defaults,
    /// Implementations keyed by method local name; other methods untouched
    Partial(BTreeMap<String, MethodImpl>),
}

impl ServiceHandler {
    /// Empty partial map, to be filled with [`ServiceHandler::method`]
    pub fn partial() -> Self {
        ServiceHandler::Partial(BTreeMap::new())
    }

    /// Add an implementation for `local_name` to a partial map.
    ///
    /// On `Defaults` this is a no-op.
    pub fn method(mut self, local_name: impl Into<String>, implementation: MethodImpl) -> Self {
        if let ServiceHandler::Partial(map) = &mut self {
            map.insert(local_name.into(), implementation);
        }
        self
    }
}

/// Validated registration, ready to be applied to a [`MockRegistry`].
///
/// Building one never touches the store, so a caller can do fallible work
/// (installing rules) between validation and [`MockRegistry::apply`].
#[derive(Debug, Clone)]
pub struct Registration {
    service: ServiceDescriptor,
    bindings: Vec<(MethodDescriptor, MethodHandler)>,
}

impl Registration {
    pub fn service(&self) -> &ServiceDescriptor {
        &self.service
    }

    /// Methods this registration binds
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.bindings.iter().map(|(method, _)| method)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Store of active mocks, keyed by method identity.
///
/// Also keeps the descriptor of every registered service, merged by type
/// name, so rules can map a request path back to a method.
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    bindings: HashMap<MethodIdentity, MethodHandler>,
    services: HashMap<String, Arc<ServiceDescriptor>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a service-wide registration.
    ///
    /// With `Defaults`, every unary method is bound to `Default`; streaming
    /// methods are skipped. With a partial map, every named method must exist
    /// and be unary.
    pub fn plan_service(
        service: &ServiceDescriptor,
        handler: &ServiceHandler,
    ) -> Result<Registration, MockError> {
        let bindings = match handler {
            ServiceHandler::Defaults => service
                .methods
                .values()
                .filter(|m| m.kind.is_unary())
                .map(|m| (m.clone(), MethodHandler::Default))
                .collect(),
            ServiceHandler::Partial(implementations) => {
                let mut bindings = Vec::with_capacity(implementations.len());
                for (local_name, implementation) in implementations {
                    let method = service.method(local_name).ok_or_else(|| {
                        MockError::UnknownMethod {
                            service: service.type_name.clone(),
                            method: local_name.clone(),
                        }
                    })?;
                    ensure_unary(service, method)?;
                    bindings.push((method.clone(), MethodHandler::Custom(implementation.clone())));
                }
                bindings
            }
        };
        Ok(Registration {
            service: service.clone(),
            bindings,
        })
    }

    /// Validate a single-method registration.
    ///
    /// The method must be declared by `service` and be unary.
    pub fn plan_method(
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
        handler: MethodHandler,
    ) -> Result<Registration, MockError> {
        if service.method_by_name(&method.name).is_none() {
            return Err(MockError::UnknownMethod {
                service: service.type_name.clone(),
                method: method.name.clone(),
            });
        }
        ensure_unary(service, method)?;
        Ok(Registration {
            service: service.clone(),
            bindings: vec![(method.clone(), handler)],
        })
    }

    /// Write a validated registration, replacing earlier bindings.
    pub fn apply(&mut self, registration: Registration) {
        let Registration { service, bindings } = registration;
        for (method, handler) in bindings {
            self.bindings.insert(service.identity(&method), handler);
        }
        match self.services.entry(service.type_name.clone()) {
            Entry::Occupied(mut known) => {
                Arc::make_mut(known.get_mut()).methods.extend(service.methods);
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(service));
            }
        }
    }

    /// Bind every method covered by `handler`; the store is left untouched on
    /// error. Returns the methods that were bound.
    pub fn register_service(
        &mut self,
        service: &ServiceDescriptor,
        handler: &ServiceHandler,
    ) -> Result<Vec<MethodDescriptor>, MockError> {
        let registration = Self::plan_service(service, handler)?;
        let bound = registration.methods().cloned().collect();
        self.apply(registration);
        Ok(bound)
    }

    /// Bind exactly one method, replacing any earlier binding for it.
    pub fn register_method(
        &mut self,
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
        handler: MethodHandler,
    ) -> Result<(), MockError> {
        let registration = Self::plan_method(service, method, handler)?;
        self.apply(registration);
        Ok(())
    }

    /// Behavior currently registered for `identity`
    pub fn resolve(&self, identity: &MethodIdentity) -> Disposition {
        self.bindings
            .get(identity)
            .map_or(Disposition::PassThrough, MethodHandler::disposition)
    }

    /// Descriptor known for `type_name`, merged across registrations
    pub fn service(&self, type_name: &str) -> Option<Arc<ServiceDescriptor>> {
        self.services.get(type_name).cloned()
    }

    /// Number of bound methods
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn ensure_unary(service: &ServiceDescriptor, method: &MethodDescriptor) -> Result<(), MockError> {
    if method.kind.is_unary() {
        Ok(())
    } else {
        Err(MockError::UnsupportedMethodKind {
            service: service.type_name.clone(),
            method: method.name.clone(),
            kind: method.kind,
        })
    }
}
