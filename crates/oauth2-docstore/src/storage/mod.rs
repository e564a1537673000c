//! Storage traits consumed by the OAuth 2.0 protocol engine.
//!
//! The engine only sees these traits; the document-backed implementations
//! live in [`crate::document`].

mod client;
mod token;

pub use client::ClientStorage;
pub use token::TokenStorage;
