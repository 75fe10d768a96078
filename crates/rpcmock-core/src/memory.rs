//! In-memory interception host.
//!
//! `MemoryContext` plays the role of a browser context: rules are installed
//! through [`RouteHost`], and [`MemoryContext::fetch`] dispatches a request to
//! the newest matching rule, or to the network callback when no rule matches
//! or the rule continues the request.

use crate::error::MockError;
use crate::host::{Fulfillment, HostError, InterceptedRequest, Route, RouteHandler, RouteHost};
use crate::matching::url_matches;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

type Network = Arc<dyn Fn(InterceptedRequest) -> BoxFuture<'static, Fulfillment> + Send + Sync>;

struct Rule {
    pattern: String,
    handler: RouteHandler,
}

#[derive(Debug)]
enum Outcome {
    Fulfilled(Fulfillment),
    Continued,
}

/// Shared in-process interception host
#[derive(Clone)]
pub struct MemoryContext {
    inner: Arc<MemoryContextInner>,
}

struct MemoryContextInner {
    /// Installed rules, oldest first
    rules: RwLock<Vec<Rule>>,
    /// Real destination for requests that are not fulfilled by a rule
    network: Network,
}

impl MemoryContext {
    /// Create a context whose unhandled traffic goes to `network`
    pub fn new<F, Fut>(network: F) -> Self
    where
        F: Fn(InterceptedRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Fulfillment> + Send + 'static,
    {
        Self {
            inner: Arc::new(MemoryContextInner {
                rules: RwLock::new(Vec::new()),
                network: Arc::new(move |request| network(request).boxed()),
            }),
        }
    }

    /// Context with no reachable backend: unhandled requests get a 502
    pub fn offline() -> Self {
        Self::new(|_| async {
            Fulfillment {
                status: 502,
                headers: Default::default(),
                body: Default::default(),
            }
        })
    }

    /// Issue a request as the application under test would.
    pub async fn fetch(&self, request: InterceptedRequest) -> Result<Fulfillment, MockError> {
        let handler = self
            .inner
            .rules
            .read()
            .await
            .iter()
            .rev()
            .find(|rule| url_matches(&rule.pattern, &request.url))
            .map(|rule| rule.handler.clone());

        let Some(handler) = handler else {
            debug!(url = %request.url, "no rule matched, sending to network");
            return Ok((self.inner.network)(request).await);
        };

        let outcome = Arc::new(Mutex::new(None));
        let route = MemoryRoute {
            outcome: outcome.clone(),
        };
        handler(Box::new(route), request.clone()).await?;

        let outcome = outcome.lock().await.take();
        match outcome {
            Some(Outcome::Fulfilled(response)) => Ok(response),
            Some(Outcome::Continued) => Ok((self.inner.network)(request).await),
            None => Err(MockError::Unhandled { url: request.url }),
        }
    }

    /// Number of installed rules
    pub async fn rule_count(&self) -> usize {
        self.inner.rules.read().await.len()
    }

    /// Installed rule patterns, oldest first
    pub async fn patterns(&self) -> Vec<String> {
        self.inner
            .rules
            .read()
            .await
            .iter()
            .map(|rule| rule.pattern.clone())
            .collect()
    }
}

#[async_trait]
impl RouteHost for MemoryContext {
    async fn route(&self, pattern: &str, handler: RouteHandler) -> Result<(), HostError> {
        glob::Pattern::new(pattern)?;
        debug!(pattern, "installing rule");
        self.inner.rules.write().await.push(Rule {
            pattern: pattern.to_owned(),
            handler,
        });
        Ok(())
    }
}

struct MemoryRoute {
    outcome: Arc<Mutex<Option<Outcome>>>,
}

impl MemoryRoute {
    async fn settle(&self, outcome: Outcome) -> Result<(), HostError> {
        let mut slot = self.outcome.lock().await;
        if slot.is_some() {
            return Err("route is already handled".into());
        }
        *slot = Some(outcome);
        Ok(())
    }
}

#[async_trait]
impl Route for MemoryRoute {
    async fn fulfill(&mut self, response: Fulfillment) -> Result<(), HostError> {
        self.settle(Outcome::Fulfilled(response)).await
    }

    async fn continue_unmodified(&mut self) -> Result<(), HostError> {
        self.settle(Outcome::Continued).await
    }
}
