//! Library crate for pathscout exposing reusable modules.
pub mod classify;
pub mod error;
pub mod probe;
pub mod scanner;
pub mod server;
pub mod target;
pub mod types;
pub mod wordlist;
