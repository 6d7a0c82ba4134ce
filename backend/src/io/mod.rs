//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers
//! translate requests into service calls and service results into pages,
//! redirects and status codes; no business rules live here.

pub mod rest;

pub use rest::*;
