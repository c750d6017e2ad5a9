//! Minimal OpenAI-compatible chat client.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol
//! (OpenAI, Azure, Ollama, various proxies). Only the chat surface is
//! exposed; callers that need richer behavior build it on top.

pub mod openai;

pub use openai::OpenAi;
