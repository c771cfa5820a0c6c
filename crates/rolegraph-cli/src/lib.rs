//! rolegraph-cli: provision, save, and load an RBAC role set in Neo4j.
//!
//! Reads settings from `rolegraph.toml` and `ROLEGRAPH__` environment
//! variables, and role sets from JSON files.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
