//! citesync library interface
//!
//! Keeps three views of a curated paper catalog in agreement: the markdown
//! document listing the papers, the JSON citation store, and the citation
//! counts reported by the Semantic Scholar Graph API. Each run reconciles
//! the store against the document, looks up stale records against the API,
//! and patches only the citation badges back into the document.

pub mod catalog;
pub mod config;
pub mod error;
pub mod services;
pub mod store;
pub mod time;
pub mod workflow;

pub use crate::error::{Error, Result};
