// Public API for the server binary and integration tests

pub mod abuse;
pub mod api;
pub mod catalog;
pub mod clock;
pub mod code;
pub mod config;
pub mod protocol;
pub mod score;
pub mod state;
pub mod types;
pub mod ws;
