//! Semantic search over ACL Anthology abstracts.
//!
//! The retrieval engine is an external service that ranks abstracts; this crate
//! loads the paper metadata, asks the engine for the best matching abstracts and
//! joins them back to full records for the CLI, the REPL and the web form.

pub mod bibtex;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod metadata;
pub mod query;
pub mod retrieval;
pub mod server;
pub mod ui;
