//! Test modules for the b2b-gateway crate
//!
//! Handler tests drive `GatewayHttpHandler` with in-memory requests; method
//! tests call the handlers directly with a spy transport.

pub mod support;
