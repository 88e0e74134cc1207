//! Streaming completion client for Issue Scribe.
//!
//! Sessions talk to the model through the [`CompletionClient`] trait and load
//! attached images through [`ImageFetcher`]; [`OpenRouterClient`] and
//! [`HttpImageFetcher`] are the production implementations.

pub mod client;
pub mod error;
pub mod images;
pub mod request;

pub use client::{CompletionClient, OpenRouterClient, TokenStream};
pub use error::{CompletionError, Result};
pub use images::{HttpImageFetcher, ImageFetcher};
pub use request::{CompletionRequest, InlineImage};
