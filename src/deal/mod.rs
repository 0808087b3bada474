pub mod service;
pub mod session;

pub use service::{DealService, FolderStore, UploadReceipt};
pub use session::SessionStore;

use crate::error::{BotError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Subfolders created inside every deal folder, in display order.
pub const SUBFOLDERS: [&str; 8] = [
    "01_КП_для_клиента",
    "02_Сметы_и_расчеты",
    "03_Договоры_и_счета",
    "04_ТЗ_и_брифы",
    "05_Макеты_и_векторы",
    "06_Производство_и_логистика",
    "07_Оплаты_и_закрывашки",
    "08_Фото_и_материалы",
];

/// Where uploads land until the chat picks another subfolder with `/to`.
pub const DEFAULT_TARGET: &str = SUBFOLDERS[7];

const CLIENT_LABELS: [&str; 2] = ["Клиент:", "Client:"];

static CLIENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Клиент|Client):\s*(.+?);").expect("Failed to compile client regex")
});

static DEAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Сделка|Deal):\s*(.+)$").expect("Failed to compile deal regex")
});

/// Client and deal names extracted from `Клиент: X; Сделка: Y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealRequest {
    pub client: String,
    pub deal: String,
}

/// True when the message is meant as a deal template (even a malformed one).
pub fn is_deal_request(text: &str) -> bool {
    CLIENT_LABELS.iter().any(|label| text.starts_with(label))
}

pub fn parse_deal_request(text: &str) -> Result<DealRequest> {
    let text = text.trim();
    if !is_deal_request(text) {
        return Err(BotError::Template);
    }

    let client_caps = CLIENT_RE.captures(text).ok_or(BotError::Template)?;
    let (Some(whole), Some(client)) = (client_caps.get(0), client_caps.get(1)) else {
        return Err(BotError::Template);
    };
    // The deal label only counts after the client field.
    let deal = DEAL_RE
        .captures(&text[whole.end()..])
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let client = client.as_str().trim().to_string();

    if client.is_empty() || deal.is_empty() {
        return Err(BotError::Template);
    }
    Ok(DealRequest { client, deal })
}

/// Accepts exactly two ASCII digits, e.g. `05`.
pub fn parse_target_code(arg: &str) -> Option<&str> {
    let code = arg.trim();
    (code.len() == 2 && code.bytes().all(|b| b.is_ascii_digit())).then_some(code)
}

/// Maps `01`..`08` to the subfolder name.
pub fn subfolder_for_code(code: &str) -> Option<&'static str> {
    SUBFOLDERS.iter().copied().find(|name| name.starts_with(code) && name[code.len()..].starts_with('_'))
}

/// Folders created for the chat's active deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealContext {
    pub deal_id: String,
    pub deal_link: String,
    pub subfolder_ids: HashMap<String, String>,
    pub target: String,
}

impl DealContext {
    /// Folder id for the current target, or the deal folder when the subfolder is unknown.
    pub fn target_folder_id(&self) -> &str {
        self.subfolder_ids
            .get(&self.target)
            .map(String::as_str)
            .unwrap_or(&self.deal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_russian_template() {
        let request = parse_deal_request("Клиент: РЖД; Сделка: куртки 300").unwrap();
        assert_eq!(request.client, "РЖД");
        assert_eq!(request.deal, "куртки 300");
    }

    #[test]
    fn parses_english_template() {
        let request = parse_deal_request("Client:  Acme Corp ;Deal: banners  ").unwrap();
        assert_eq!(request.client, "Acme Corp");
        assert_eq!(request.deal, "banners");
    }

    #[test]
    fn client_stops_at_first_semicolon() {
        let request = parse_deal_request("Клиент: ООО Ромашка; Сделка: футболки; синие").unwrap();
        assert_eq!(request.client, "ООО Ромашка");
        assert_eq!(request.deal, "футболки; синие");
    }

    #[test]
    fn deal_label_inside_client_name_is_ignored() {
        let request = parse_deal_request("Client: Big Deal: Co; Deal: x").unwrap();
        assert_eq!(request.client, "Big Deal: Co");
        assert_eq!(request.deal, "x");

        let request = parse_deal_request("Клиент: Сделка: Плюс; Сделка: кружки").unwrap();
        assert_eq!(request.client, "Сделка: Плюс");
        assert_eq!(request.deal, "кружки");
    }

    #[test]
    fn rejects_incomplete_templates() {
        assert!(matches!(parse_deal_request("Клиент: РЖД"), Err(BotError::Template)));
        assert!(matches!(parse_deal_request("Клиент: РЖД; куртки"), Err(BotError::Template)));
        assert!(matches!(parse_deal_request("Клиент: ; Сделка: x"), Err(BotError::Template)));
        assert!(matches!(parse_deal_request("Клиент: РЖД; Сделка:   "), Err(BotError::Template)));
        assert!(matches!(parse_deal_request("hello"), Err(BotError::Template)));
    }

    #[test]
    fn deal_request_detection_is_prefix_only() {
        assert!(is_deal_request("Клиент: x"));
        assert!(is_deal_request("Client: x"));
        assert!(!is_deal_request("мой Клиент: x"));
    }

    #[test]
    fn target_codes() {
        assert_eq!(parse_target_code(" 05 "), Some("05"));
        assert_eq!(parse_target_code("5"), None);
        assert_eq!(parse_target_code("ab"), None);
        assert_eq!(parse_target_code("005"), None);

        assert_eq!(subfolder_for_code("01"), Some("01_КП_для_клиента"));
        assert_eq!(subfolder_for_code("08"), Some(DEFAULT_TARGET));
        assert_eq!(subfolder_for_code("09"), None);
        assert_eq!(subfolder_for_code("00"), None);
    }

    #[test]
    fn target_falls_back_to_deal_folder() {
        let mut ctx = DealContext {
            deal_id: "deal".into(),
            deal_link: String::new(),
            subfolder_ids: HashMap::from([(DEFAULT_TARGET.to_string(), "photos".to_string())]),
            target: DEFAULT_TARGET.into(),
        };
        assert_eq!(ctx.target_folder_id(), "photos");

        ctx.target = SUBFOLDERS[0].into();
        assert_eq!(ctx.target_folder_id(), "deal");
    }
}
