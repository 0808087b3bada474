use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Deploy-time variables that predate the `BRANDCOMM_` prefix, mapped to their config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("TELEGRAM_BOT_TOKEN", "telegram.bot_token"),
    ("TELEGRAM_SECRET_TOKEN", "telegram.secret_token"),
    ("PUBLIC_URL", "telegram.public_url"),
    ("PORT", "server.port"),
    ("GDRIVE_ROOT_FOLDER_ID", "google.root_folder_id"),
    ("GOOGLE_CLIENT_ID", "google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "google.client_secret"),
    ("GOOGLE_REDIRECT_URI", "google.redirect_uri"),
    ("TOKEN_JSON", "google.token_json"),
    ("GOOGLE_SERVICE_ACCOUNT_B64", "google.service_account_b64"),
    ("OPENAI_API_KEY", "openai.api_key"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub ledger: LedgerConfig,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub secret_token: Option<String>,
    /// Public base URL Telegram can reach, e.g. `https://bot.example.com`.
    pub public_url: Option<String>,
    pub webhook_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub root_folder_id: String,
    pub token_path: String,
    pub token_json: Option<String>,
    pub service_account_b64: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub drive_api_url: String,
    pub upload_api_url: String,
    pub sheets_api_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    None,
    Sqlite,
    Sheets,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    pub sqlite_path: String,
    pub spreadsheet_id: Option<String>,
    pub sheet_range: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
}

impl Config {
    /// Loads defaults, then `path` (if it exists), then `BRANDCOMM_*` and legacy env vars.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::load_from(path, std::env::vars().collect())
    }

    /// Same as [`load`](Self::load) with `env` standing in for the process environment.
    pub fn load_from(path: &str, env: HashMap<String, String>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("telegram.bot_token", "")?
            .set_default("telegram.webhook_path", "/telegram/webhook")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("google.client_id", "")?
            .set_default("google.client_secret", "")?
            .set_default("google.redirect_uri", "")?
            .set_default("google.root_folder_id", "")?
            .set_default("google.token_path", "/etc/secrets/token.json")?
            .set_default("google.auth_uri", "https://accounts.google.com/o/oauth2/auth")?
            .set_default("google.token_uri", "https://oauth2.googleapis.com/token")?
            .set_default("google.drive_api_url", "https://www.googleapis.com/drive/v3")?
            .set_default("google.upload_api_url", "https://www.googleapis.com/upload/drive/v3")?
            .set_default("google.sheets_api_url", "https://sheets.googleapis.com/v4")?
            .set_default("ledger.backend", "none")?
            .set_default("ledger.sqlite_path", "deals.db")?
            .set_default("ledger.sheet_range", "Deals!A:F")?
            .set_default("openai.model", "gpt-5.2")?
            .set_default("openai.api_url", "https://api.openai.com/v1")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("BRANDCOMM")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env.clone())),
            );

        for (var, key) in LEGACY_ENV {
            builder = builder.set_override_option(*key, env_value(&env, var))?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config.normalized())
    }

    /// Trims every value and turns blank optionals into `None`.
    fn normalized(mut self) -> Self {
        fn trim(s: &mut String) {
            *s = s.trim().to_string();
        }
        fn opt(s: Option<String>) -> Option<String> {
            s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        trim(&mut self.telegram.bot_token);
        trim(&mut self.telegram.webhook_path);
        self.telegram.secret_token = opt(self.telegram.secret_token.take());
        self.telegram.public_url = opt(self.telegram.public_url.take());

        trim(&mut self.google.client_id);
        trim(&mut self.google.client_secret);
        trim(&mut self.google.redirect_uri);
        trim(&mut self.google.root_folder_id);
        self.google.token_json = opt(self.google.token_json.take());
        self.google.service_account_b64 = opt(self.google.service_account_b64.take());

        self.ledger.spreadsheet_id = opt(self.ledger.spreadsheet_id.take());
        self.openai.api_key = opt(self.openai.api_key.take());
        self
    }

    /// Checks the settings the webhook server cannot run without.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::BotError;

        if self.telegram.bot_token.is_empty() {
            return Err(BotError::Config("telegram.bot_token is empty".into()));
        }
        if self.google.root_folder_id.is_empty() {
            return Err(BotError::Config("google.root_folder_id is empty".into()));
        }
        if self.ledger.backend == LedgerBackend::Sheets && self.ledger.spreadsheet_id.is_none() {
            return Err(BotError::Config(
                "ledger.backend = sheets requires ledger.spreadsheet_id".into(),
            ));
        }
        if let Some(secret) = &self.telegram.secret_token {
            let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
            if secret.len() > 256 || !secret.chars().all(allowed) {
                return Err(BotError::Config(
                    "telegram.secret_token must be 1-256 chars of A-Z, a-z, 0-9, _ or -".into(),
                ));
            }
        }
        if !self.telegram.webhook_path.starts_with('/') {
            return Err(BotError::Config("telegram.webhook_path must start with '/'".into()));
        }
        Ok(())
    }

    /// Full webhook URL registered with Telegram.
    pub fn webhook_url(&self) -> anyhow::Result<url::Url> {
        let base = self
            .telegram
            .public_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("telegram.public_url (PUBLIC_URL) is not set"))?;
        let url = format!("{}{}", base.trim_end_matches('/'), self.telegram.webhook_path);
        url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid webhook URL {}: {}", url, e))
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))
    }

    /// OAuth scopes requested at consent time.
    pub fn google_scopes(&self) -> Vec<&'static str> {
        let mut scopes = vec![DRIVE_SCOPE];
        if self.ledger.backend == LedgerBackend::Sheets {
            scopes.push(SHEETS_SCOPE);
        }
        scopes
    }
}

fn env_value(env: &HashMap<String, String>, name: &str) -> Option<String> {
    env.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_toml(contents: &str) -> Config {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        Config::load_from(file.path().to_str().unwrap(), HashMap::new()).unwrap()
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_from("/nonexistent/brandcomm-config", HashMap::new()).unwrap();
        assert_eq!(config.telegram.webhook_path, "/telegram/webhook");
        assert_eq!(config.google.token_path, "/etc/secrets/token.json");
        assert_eq!(config.ledger.backend, LedgerBackend::None);
        assert_eq!(config.openai.api_url, "https://api.openai.com/v1");
    }

    #[test]
    fn file_values_are_trimmed_and_blank_optionals_dropped() {
        let config = load_toml(
            r#"
            [telegram]
            bot_token = "  123:abc  "
            secret_token = "   "
            public_url = "https://bot.example.com/"

            [google]
            root_folder_id = " root-id "

            [ledger]
            backend = "sheets"
            spreadsheet_id = "sheet-1"
            "#,
        );

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert!(config.telegram.secret_token.is_none());
        assert_eq!(config.google.root_folder_id, "root-id");
        assert_eq!(config.ledger.backend, LedgerBackend::Sheets);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.webhook_url().unwrap().as_str(),
            "https://bot.example.com/telegram/webhook"
        );
        assert_eq!(config.google_scopes(), vec![DRIVE_SCOPE, SHEETS_SCOPE]);
    }

    #[test]
    fn validate_rejects_sheets_without_spreadsheet() {
        let config = load_toml(
            r#"
            [telegram]
            bot_token = "123:abc"

            [google]
            root_folder_id = "root"

            [ledger]
            backend = "sheets"
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn webhook_url_requires_public_url() {
        let config = load_toml("[telegram]\nbot_token = \"t\"\n");
        assert!(config.webhook_url().is_err());
        assert_eq!(config.google_scopes(), vec![DRIVE_SCOPE]);
    }

    #[test]
    fn validate_rejects_secret_with_illegal_chars() {
        let mut config = load_toml("[telegram]\nbot_token = \"t\"\n[google]\nroot_folder_id = \"root\"\n");
        config.telegram.secret_token = Some("has space".into());
        assert!(config.validate().is_err());

        config.telegram.secret_token = Some("ok_secret-123".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[telegram]\nbot_token = \"from-file\"\n[server]\nport = 3000\n").unwrap();
        let env = HashMap::from([
            ("TELEGRAM_BOT_TOKEN".to_string(), " from-env ".to_string()),
            ("GDRIVE_ROOT_FOLDER_ID".to_string(), "".to_string()),
            ("BRANDCOMM_SERVER__PORT".to_string(), "9000".to_string()),
            ("BRANDCOMM_LEDGER__BACKEND".to_string(), "sqlite".to_string()),
        ]);

        let config = Config::load_from(file.path().to_str().unwrap(), env).unwrap();
        assert_eq!(config.telegram.bot_token, "from-env");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.ledger.backend, LedgerBackend::Sqlite);
        assert_eq!(config.google.root_folder_id, "");
    }

    #[test]
    fn legacy_port_beats_prefixed_port() {
        let env = HashMap::from([
            ("PORT".to_string(), "10000".to_string()),
            ("BRANDCOMM_SERVER__PORT".to_string(), "9000".to_string()),
        ]);
        let config = Config::load_from("/nonexistent/brandcomm-config", env).unwrap();
        assert_eq!(config.server.port, 10000);
    }
}
