//! Built-in screening flows.

pub mod hiv;
