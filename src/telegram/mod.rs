pub mod bot;
pub mod commands;
pub mod formatters;
pub mod handlers;

pub use bot::{run_webhook, BotState};
