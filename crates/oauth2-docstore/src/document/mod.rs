//! Client and token stores backed by a [`DocumentStore`].
//!
//! [`DocumentStore`]: oauth2_docstore_storage::DocumentStore

mod client;
mod index;
mod token;

pub use client::DocumentClientStore;
pub use index::{TokenIndex, token_design};
pub use token::DocumentTokenStore;
