//! Mock registration and resolution.
//!
//! - [`MockRegistry`](manager::MockRegistry): per-method behavior, last registration wins
//! - [`MockRouter`](controller::MockRouter): registration entry points and interception rules
//! - [`adapter`]: bridges an intercepted exchange to a router-built handler

pub mod adapter;
pub mod controller;
pub mod manager;
