//! API module - Route handlers and router

pub mod completion;
pub mod health;
pub mod routes;
pub mod upload;
