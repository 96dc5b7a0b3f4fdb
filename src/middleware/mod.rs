//! Middleware module - Bearer authentication and panic recovery

pub mod auth;
pub mod panic;
