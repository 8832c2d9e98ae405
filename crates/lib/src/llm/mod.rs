//! LLM client (Ollama).
//!
//! Blocking, non-streaming chat completion against a local Ollama instance.
//! The agent's `run` contract is synchronous; the dispatch bridge offloads it
//! to the blocking pool, so the client here is `reqwest::blocking`.

mod ollama;

pub use ollama::{ChatMessage, OllamaClient, OllamaError};
