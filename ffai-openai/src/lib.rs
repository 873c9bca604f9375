mod client;
mod config;

pub use crate::client::{ChatGptClient, ClientError};
pub use crate::config::{OpenAiConfig, Provider};
