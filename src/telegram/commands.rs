use teloxide::{prelude::*, utils::command::BotCommands};
use crate::deal::{parse_target_code, subfolder_for_code, SessionStore};
use crate::telegram::bot::{BotState, Command};
use crate::telegram::formatters;
use std::sync::Arc;
use tracing::info;

pub async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let reply = command_reply(&cmd, msg.chat.id.0, &state.sessions);
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Text answered for `cmd`; `/to` also switches the chat's upload target.
pub fn command_reply(cmd: &Command, chat_id: i64, sessions: &SessionStore) -> String {
    match cmd {
        Command::Start => formatters::START_TEXT.to_string(),
        Command::Help => Command::descriptions().to_string(),
        Command::Where => match sessions.get(chat_id) {
            Some(ctx) => formatters::active_deal(&ctx),
            None => formatters::NO_ACTIVE_DEAL.to_string(),
        },
        Command::To(arg) => {
            if sessions.get(chat_id).is_none() {
                return formatters::CREATE_DEAL_FIRST.to_string();
            }
            let Some(folder) = parse_target_code(arg).and_then(subfolder_for_code) else {
                return formatters::UNKNOWN_CODE.to_string();
            };
            if !sessions.set_target(chat_id, folder) {
                return formatters::CREATE_DEAL_FIRST.to_string();
            }
            info!("Chat {} now uploads to {}", chat_id, folder);
            formatters::target_set(folder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{DealContext, DEFAULT_TARGET};
    use std::collections::HashMap;

    fn sessions_with_deal(chat_id: i64) -> SessionStore {
        let sessions = SessionStore::new();
        sessions.insert(
            chat_id,
            DealContext {
                deal_id: "deal".into(),
                deal_link: "https://drive/deal".into(),
                subfolder_ids: HashMap::new(),
                target: DEFAULT_TARGET.into(),
            },
        );
        sessions
    }

    #[test]
    fn where_without_deal() {
        let sessions = SessionStore::new();
        assert_eq!(command_reply(&Command::Where, 1, &sessions), formatters::NO_ACTIVE_DEAL);
    }

    #[test]
    fn where_with_deal_shows_target() {
        let sessions = sessions_with_deal(1);
        let reply = command_reply(&Command::Where, 1, &sessions);
        assert!(reply.contains("https://drive/deal"));
        assert!(reply.ends_with(DEFAULT_TARGET));
    }

    #[test]
    fn to_requires_deal_before_checking_code() {
        let sessions = SessionStore::new();
        assert_eq!(
            command_reply(&Command::To("99".into()), 1, &sessions),
            formatters::CREATE_DEAL_FIRST
        );
    }

    #[test]
    fn to_rejects_unknown_codes() {
        let sessions = sessions_with_deal(1);
        for arg in ["09", "5", "", "макеты"] {
            assert_eq!(
                command_reply(&Command::To(arg.into()), 1, &sessions),
                formatters::UNKNOWN_CODE
            );
        }
        assert_eq!(sessions.get(1).unwrap().target, DEFAULT_TARGET);
    }

    #[test]
    fn to_switches_target() {
        let sessions = sessions_with_deal(1);
        let reply = command_reply(&Command::To("05".into()), 1, &sessions);
        assert_eq!(reply, "Ок. Следующие файлы загружу в: 05_Макеты_и_векторы");
        assert_eq!(sessions.get(1).unwrap().target, "05_Макеты_и_векторы");
    }

    #[test]
    fn start_explains_template() {
        let sessions = SessionStore::new();
        assert!(command_reply(&Command::Start, 1, &sessions).contains("Клиент: РЖД; Сделка: куртки 300"));
    }
}
