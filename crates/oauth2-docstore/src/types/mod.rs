//! Record types exchanged with the protocol engine.

mod client;
mod token;

pub use client::Client;
pub use token::TokenRecord;
