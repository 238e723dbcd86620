//! Domain models for resource allocation.
//!
//! These are the core types shared across all crates.

pub mod actor;
pub mod allocation;
pub mod assignment;
pub mod candidate;
pub mod change_note;
pub mod employee;
pub mod notification;
