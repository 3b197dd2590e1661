//! castcall library
//!
//! Actor-fee caching and a retrying generative-AI client for the book-to-film
//! casting game, plus the HTTP surface and CLI plumbing around them.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod genai;
pub mod prompts;
pub mod server;
pub mod store;
