//! Core domain types for RPC services and methods.

pub mod descriptor;
