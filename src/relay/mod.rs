//! Relay module - Request shaping for the upload and completion paths

pub mod completion;
pub mod metadata;
pub mod upload;
