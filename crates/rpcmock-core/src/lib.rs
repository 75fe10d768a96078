//! Core library for mocking unary RPC calls in browser tests.
//!
//! Test code registers per-method behavior on a [`MockRouter`]; the router
//! installs interception rules on a [`RouteHost`] and answers matching
//! exchanges through an external [`RpcRouter`], or lets them reach the
//! network untouched.

pub mod config;
pub mod error;
pub mod host;
pub mod matching;
pub mod memory;
pub mod mocks;
pub mod router;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::options::{BinaryOptions, JsonOptions, MockRouterOptions, RouterOptions};
pub use error::MockError;
pub use host::{Fulfillment, InterceptedRequest, Route, RouteHandler, RouteHost};
pub use memory::MemoryContext;
pub use mocks::controller::MockRouter;
pub use mocks::manager::{Disposition, MethodHandler, MockRegistry, Registration, ServiceHandler};
pub use router::{Code, MethodImpl, RpcError, RpcRouter, UniversalHandler};
pub use types::descriptor::{MethodDescriptor, MethodIdentity, MethodKind, ServiceDescriptor};
