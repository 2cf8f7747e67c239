pub mod config;
pub mod export;
pub mod prepare;
pub mod repl;
pub mod search;
pub mod stats;
