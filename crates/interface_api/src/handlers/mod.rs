//! Request handlers, one module per bounded context

pub mod claims;
pub mod health;
pub mod quotation;
pub mod subscription;
