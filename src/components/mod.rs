//! UI components.

pub mod viewport;
