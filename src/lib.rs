//! memvault - semantic document memory for a home-services marketplace
//!
//! This crate provides:
//! - A document store with blob relocation for oversized content
//! - Embedding-based search with one-hop relationship expansion
//! - Regex intent and entity extraction for booking conversations

pub mod analysis;
pub mod commands;
pub mod config;
pub mod embed;
pub mod embedding_backend;
pub mod error;
pub mod generate;
pub mod intent;
pub mod memory;
pub mod progress;
pub mod rank;
pub mod relations;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use memory::Memory;
