//! Backend module - Provider traits and their HTTP clients

pub mod anthropic;
pub mod cloudinary;
pub mod traits;
