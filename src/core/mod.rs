//! core
//!
//! Domain types and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: `BranchName`, `Oid`, `RefName`
//! - [`config`] - Global and repository configuration

pub mod config;
pub mod types;
