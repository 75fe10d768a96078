//! Mock router: registration entry points and per-exchange resolution.
//!
//! This module provides `MockRouter`, which records registrations in a
//! [`MockRegistry`] and installs interception rules on a [`RouteHost`]. Every
//! rule consults the registry when an exchange arrives, so a later
//! registration takes effect without replacing earlier rules.

use crate::config::options::MockRouterOptions;
use crate::error::MockError;
use crate::host::{InterceptedRequest, Route, RouteHandler, RouteHost};
use crate::matching::{method_name_from_url, method_pattern, service_pattern};
use crate::mocks::adapter::fulfill_with_handler;
use crate::mocks::manager::{
    Disposition, MethodHandler, MockRegistry, Registration, ServiceHandler,
};
use crate::router::{MethodImpl, RpcRouter};
use crate::types::descriptor::{MethodDescriptor, MethodIdentity, ServiceDescriptor};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Entry point for test code registering RPC mocks.
///
/// Cloning is cheap; clones share the same registrations and rules.
#[derive(Clone)]
pub struct MockRouter {
    inner: Arc<MockRouterInner>,
}

struct MockRouterInner {
    host: Arc<dyn RouteHost>,
    rpc_router: Arc<dyn RpcRouter>,
    options: MockRouterOptions,
    registry: RwLock<MockRegistry>,
    /// Patterns already installed on the host by this router
    installed: Mutex<HashSet<String>>,
}

impl MockRouter {
    pub fn new(
        host: Arc<dyn RouteHost>,
        rpc_router: Arc<dyn RpcRouter>,
        options: MockRouterOptions,
    ) -> Self {
        Self {
            inner: Arc::new(MockRouterInner {
                host,
                rpc_router,
                options,
                registry: RwLock::new(MockRegistry::new()),
                installed: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn options(&self) -> &MockRouterOptions {
        &self.inner.options
    }

    /// Mock a whole service.
    ///
    /// `ServiceHandler::Defaults` answers every unary method with its zero
    /// value through one wildcard rule. A partial map binds only the listed
    /// methods, each through its own rule; other methods keep whatever
    /// behavior they had.
    ///
    /// # Errors
    /// Returns error if a listed method is unknown or not unary, or if the
    /// host rejects a rule. The store is unchanged in every error case.
    pub async fn service(
        &self,
        service: &ServiceDescriptor,
        handler: ServiceHandler,
    ) -> Result<&Self, MockError> {
        let registration = MockRegistry::plan_service(service, &handler)?;
        let base_url = &self.inner.options.base_url;
        let patterns = match &handler {
            ServiceHandler::Defaults => vec![service_pattern(base_url, &service.type_name)],
            ServiceHandler::Partial(_) => registration
                .methods()
                .map(|method| method_pattern(base_url, &service.type_name, &method.name))
                .collect(),
        };
        let methods = registration.methods().count();

        self.commit(registration, patterns).await?;
        info!(
            service = %service.type_name,
            methods,
            defaults = matches!(handler, ServiceHandler::Defaults),
            "registered service mock"
        );
        Ok(self)
    }

    /// Mock a single method.
    ///
    /// # Errors
    /// Returns `UnknownMethod` if `service` does not declare the method,
    /// `UnsupportedMethodKind` if it is not unary, or `Host` if the rule
    /// cannot be installed. The store is unchanged in every error case.
    pub async fn rpc(
        &self,
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
        handler: MethodHandler,
    ) -> Result<&Self, MockError> {
        let registration = MockRegistry::plan_method(service, method, handler)?;
        let pattern = method_pattern(&self.inner.options.base_url, &service.type_name, &method.name);

        self.commit(registration, vec![pattern]).await?;
        info!(method = %service.identity(method), "registered method mock");
        Ok(self)
    }

    /// Behavior currently registered for `identity`
    pub async fn resolve(&self, identity: &MethodIdentity) -> Disposition {
        self.inner.registry.read().await.resolve(identity)
    }

    /// Install `patterns`, then write `registration` to the store.
    ///
    /// Rules installed before a failing one stay on the host. They resolve
    /// against the unchanged store, so requests they catch behave as before.
    async fn commit(
        &self,
        registration: Registration,
        patterns: Vec<String>,
    ) -> Result<(), MockError> {
        let type_name = registration.service().type_name.clone();
        for pattern in patterns {
            self.install(pattern, &type_name).await?;
        }
        self.inner.registry.write().await.apply(registration);
        Ok(())
    }

    async fn install(&self, pattern: String, type_name: &str) -> Result<(), MockError> {
        let mut installed = self.inner.installed.lock().await;
        if installed.contains(&pattern) {
            debug!(%pattern, "reusing installed rule");
            return Ok(());
        }

        let handler = exchange_handler(Arc::downgrade(&self.inner), type_name.to_owned());
        self.inner
            .host
            .route(&pattern, handler)
            .await
            .map_err(MockError::Host)?;
        debug!(%pattern, "installed rule");
        installed.insert(pattern);
        Ok(())
    }
}

/// Rule callback. Holds the router weakly: rules live on the host, and the
/// host may outlive the router.
fn exchange_handler(inner: Weak<MockRouterInner>, type_name: String) -> RouteHandler {
    Arc::new(move |mut route: Box<dyn Route>, request: InterceptedRequest| {
        let inner = inner.clone();
        let type_name = type_name.clone();
        async move {
            match inner.upgrade() {
                Some(inner) => inner.handle_exchange(&type_name, route, request).await,
                None => route.continue_unmodified().await.map_err(MockError::Host),
            }
        }
        .boxed()
    })
}

impl MockRouterInner {
    async fn handle_exchange(
        &self,
        type_name: &str,
        mut route: Box<dyn Route>,
        request: InterceptedRequest,
    ) -> Result<(), MockError> {
        let service = self.registry.read().await.service(type_name);
        let Some(service) = service else {
            debug!(url = %request.url, service = type_name, "service not registered yet");
            return route.continue_unmodified().await.map_err(MockError::Host);
        };

        let method = method_name_from_url(&request.url)
            .and_then(|name| service.method_by_name(&name))
            .ok_or_else(|| {
                warn!(url = %request.url, service = type_name, "no associated method");
                MockError::UnmatchedUrl {
                    url: request.url.clone(),
                }
            })?;

        if !method.kind.is_unary() {
            debug!(url = %request.url, kind = %method.kind, "passing through non-unary method");
            return route.continue_unmodified().await.map_err(MockError::Host);
        }

        let identity = service.identity(method);
        let disposition = self.registry.read().await.resolve(&identity);
        debug!(%identity, ?disposition, "resolved disposition");

        let implementation = match disposition {
            Disposition::PassThrough => {
                return route.continue_unmodified().await.map_err(MockError::Host);
            }
            Disposition::Default => MethodImpl::empty(),
            Disposition::Custom(implementation) => implementation,
        };

        let handler = self.rpc_router.rpc(
            &service,
            method,
            implementation,
            &self.options.router_options(),
        );
        fulfill_with_handler(
            handler.as_ref(),
            route.as_mut(),
            &request,
            self.options.read_max_bytes,
        )
        .await
    }
}
