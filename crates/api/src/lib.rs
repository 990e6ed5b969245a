//! HTTP API: server wiring, identity middleware, guarded routes.

pub mod app;
pub mod authz;
pub mod config;
pub mod middleware;
