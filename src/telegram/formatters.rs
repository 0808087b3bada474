use crate::deal::{DealContext, UploadReceipt};
use crate::error::BotError;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub const START_TEXT: &str = "1) Создай сделку:\n\
Клиент: РЖД; Сделка: куртки 300\n\n\
2) Выбери подпапку (опционально):\n\
/to 05  (макеты)\n\
/to 03  (договоры)\n\
/to 01  (КП)\n\n\
3) Отправь файл (фото/документ) — я загружу в Drive.\n\
4) Пиши обычным текстом — отвечу как GPT (если включён ключ).";

pub const NO_ACTIVE_DEAL: &str = "Активной сделки нет. Сначала создай: Клиент: ...; Сделка: ...";
pub const CREATE_DEAL_FIRST: &str = "Сначала создай сделку: Клиент: ...; Сделка: ...";
pub const UNKNOWN_CODE: &str = "Не понял код. Используй /to 01..08";
pub const TEMPLATE_HINT: &str = "Формат такой: Клиент: РЖД; Сделка: куртки 300";

pub fn active_deal(ctx: &DealContext) -> String {
    format!("Активная сделка:\n{}\nТекущая подпапка: {}", ctx.deal_link, ctx.target)
}

pub fn target_set(folder: &str) -> String {
    format!("Ок. Следующие файлы загружу в: {}", folder)
}

pub fn deal_created(ctx: &DealContext) -> String {
    format!(
        "Сделка создана ✅\n{}\nПодпапки: {} шт.",
        ctx.deal_link,
        ctx.subfolder_ids.len()
    )
}

pub fn deal_failed(error: &BotError) -> String {
    format!("Ошибка создания сделки: {}", error)
}

pub fn file_uploaded(receipt: &UploadReceipt) -> String {
    format!("Файл загружен ✅\n{}\n{}", receipt.target, receipt.link)
}

pub fn upload_failed(error: &BotError) -> String {
    format!("Ошибка загрузки файла: {}", error)
}

/// Splits `text` into Telegram-sized chunks, preferring line breaks.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                if current_len + piece.len() > max_chars {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.extend(piece);
                current_len += piece.len();
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::SUBFOLDERS;
    use std::collections::HashMap;

    #[test]
    fn deal_created_mentions_link_and_count() {
        let ctx = DealContext {
            deal_id: "d".into(),
            deal_link: "https://drive/d".into(),
            subfolder_ids: SUBFOLDERS.iter().map(|s| (s.to_string(), s.to_string())).collect::<HashMap<_, _>>(),
            target: SUBFOLDERS[7].into(),
        };
        assert_eq!(deal_created(&ctx), "Сделка создана ✅\nhttps://drive/d\nПодпапки: 8 шт.");
        assert_eq!(
            active_deal(&ctx),
            "Активная сделка:\nhttps://drive/d\nТекущая подпапка: 08_Фото_и_материалы"
        );
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("привет", MAX_MESSAGE_CHARS), vec!["привет".to_string()]);
        assert!(split_message("", MAX_MESSAGE_CHARS).is_empty());
    }

    #[test]
    fn splits_on_lines_then_chars() {
        let chunks = split_message("aaa\nbbb\ncc", 5);
        assert_eq!(chunks, vec!["aaa\n", "bbb\n", "cc"]);

        let chunks = split_message("ююююююю", 3);
        assert_eq!(chunks, vec!["ююю", "ююю", "ю"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
    }
}
