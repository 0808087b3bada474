use teloxide::{net::Download, prelude::*, types::FileId};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::deal::{self, DealContext, UploadReceipt};
use crate::error::Result;
use crate::telegram::bot::BotState;
use crate::telegram::formatters::{self, MAX_MESSAGE_CHARS};

/// A file attached to a message, resolved to what we upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_id: FileId,
    pub filename: String,
}

impl Attachment {
    /// Documents keep their name; photos use the largest size as `photo.jpg`.
    pub fn from_message(msg: &Message) -> Option<Self> {
        if let Some(document) = msg.document() {
            return Some(Self {
                file_id: document.file.id.clone(),
                filename: document.file_name.clone().unwrap_or_else(|| "file".to_string()),
            });
        }
        msg.photo()
            .and_then(|sizes| sizes.last())
            .map(|photo| Self {
                file_id: photo.file.id.clone(),
                filename: "photo.jpg".to_string(),
            })
    }
}

pub async fn create_deal(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let request = match deal::parse_deal_request(msg.text().unwrap_or_default()) {
        Ok(request) => request,
        Err(_) => {
            bot.send_message(chat_id, formatters::TEMPLATE_HINT).await?;
            return Ok(());
        }
    };

    info!("Chat {} opens deal '{}' for '{}'", chat_id.0, request.deal, request.client);

    let reply = match state.deals.open_deal(chat_id.0, &request).await {
        Ok(ctx) => {
            let reply = formatters::deal_created(&ctx);
            state.sessions.insert(chat_id.0, ctx);
            debug!("{} chats hold an active deal", state.sessions.active_chats());
            reply
        }
        Err(e) => {
            error!("Failed to create deal for chat {}: {}", chat_id.0, e);
            formatters::deal_failed(&e)
        }
    };

    bot.send_message(chat_id, reply).await?;
    Ok(())
}

pub async fn upload_attachment(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let Some(ctx) = state.sessions.get(chat_id.0) else {
        bot.send_message(chat_id, formatters::CREATE_DEAL_FIRST).await?;
        return Ok(());
    };
    let Some(attachment) = Attachment::from_message(&msg) else {
        return Ok(());
    };

    let reply = match transfer(&bot, &state, &ctx, attachment).await {
        Ok(receipt) => formatters::file_uploaded(&receipt),
        Err(e) => {
            error!("Failed to upload file for chat {}: {}", chat_id.0, e);
            formatters::upload_failed(&e)
        }
    };

    bot.send_message(chat_id, reply).await?;
    Ok(())
}

/// Telegram -> memory -> Drive.
async fn transfer(
    bot: &Bot,
    state: &BotState,
    ctx: &DealContext,
    attachment: Attachment,
) -> Result<UploadReceipt> {
    let file = bot.get_file(attachment.file_id).await?;
    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data).await?;

    state.deals.upload(ctx, &attachment.filename, data).await
}

pub async fn chat(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default().trim();
    let reply = state.assistant.reply(text).await;

    for chunk in formatters::split_message(&reply, MAX_MESSAGE_CHARS) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}
