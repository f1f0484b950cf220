//! vox ollama - Ollama integration for embeddings and grounded answers.
//!
//! This crate provides an async client for Ollama's API and the
//! [`EmbeddingGateway`](vox_core::EmbeddingGateway) and
//! [`AnswerGenerator`](vox_core::AnswerGenerator) implementations built on it.

mod client;
mod error;
mod providers;
pub mod rag;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use providers::{OllamaEmbedder, OllamaGenerator};
pub use types::*;
