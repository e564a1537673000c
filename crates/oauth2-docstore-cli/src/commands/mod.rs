pub mod client;
pub mod setup;
pub mod token;
