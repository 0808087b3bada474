pub mod assistant;
pub mod cli;
pub mod config;
pub mod deal;
pub mod error;
pub mod google;
pub mod ledger;
pub mod server;
pub mod storage;
pub mod telegram;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
