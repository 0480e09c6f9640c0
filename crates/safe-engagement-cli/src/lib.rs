//! Terminal front end for the engagement screening: config file handling,
//! flow and tier loading, and the chat and form renderers.

pub mod commands;
pub mod config;
pub mod loader;
pub mod render;
