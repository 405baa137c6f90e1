//! ui
//!
//! Terminal output helpers.
//!
//! Commands print through [`output`] so quiet mode is honored in one place.

pub mod output;
