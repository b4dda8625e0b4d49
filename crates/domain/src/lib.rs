pub mod config;
pub mod error;
pub mod reward;
pub mod trace;
