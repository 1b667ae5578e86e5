pub mod lichess_api;
pub mod types;
