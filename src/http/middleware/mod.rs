//! Request-path middleware.

pub mod allowed_methods;

pub use allowed_methods::{allowed_methods_middleware, MethodGateState};
