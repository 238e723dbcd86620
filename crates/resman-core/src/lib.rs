//! Shared domain models, error types, and collaborator traits for the
//! resource allocation workflow.

pub mod error;
pub mod models;
pub mod repository;
