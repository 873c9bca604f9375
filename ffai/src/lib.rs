pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod environment;
pub mod errors;
pub mod exec;
pub mod generate;

pub use crate::commands::run;
