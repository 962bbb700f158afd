//! Language-model seam.
//!
//! Calling a model is owned by the outer service; this crate only needs a
//! narrow [`LLMClient`] trait so the routing layer can ask a model to
//! classify a query when the keyword heuristics come up empty.

/// Core LLM client trait.
pub mod client;

pub use client::LLMClient;
