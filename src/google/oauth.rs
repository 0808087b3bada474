//! Google consent flow used once to obtain the bot's refresh token.

use chrono::Utc;
use tracing::info;
use url::Url;

use crate::config::GoogleConfig;
use crate::error::{BotError, Result};
use crate::google::auth::{format_expiry, AuthorizedUser, TokenResponse};

pub struct OAuthFlow {
    http: reqwest::Client,
    config: GoogleConfig,
    scopes: Vec<String>,
}

impl OAuthFlow {
    pub fn new(http: reqwest::Client, config: GoogleConfig, scopes: Vec<String>) -> Self {
        Self { http, config, scopes }
    }

    /// Consent URL that yields a refresh token (`access_type=offline`, `prompt=consent`).
    pub fn authorization_url(&self) -> Result<Url> {
        if self.config.client_id.is_empty() || self.config.redirect_uri.is_empty() {
            return Err(BotError::Config(
                "google.client_id and google.redirect_uri are required for the consent flow".into(),
            ));
        }

        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.config.auth_uri,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("include_granted_scopes", "true"),
            ],
        )
        .map_err(|e| BotError::Config(format!("Invalid google.auth_uri: {}", e)))
    }

    /// Trades the callback `code` for a credential in `token.json` form.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthorizedUser> {
        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }

        let body: TokenResponse = response.json().await?;
        let expiry = format_expiry(body.expires_at(Utc::now()));
        let refresh_token = body.refresh_token.ok_or_else(|| {
            BotError::OAuthNotCompleted(
                "no refresh_token returned; revoke the app's access and run /auth again".into(),
            )
        })?;

        info!("OAuth consent completed for client {}", self.config.client_id);

        Ok(AuthorizedUser {
            token: Some(body.access_token),
            refresh_token,
            token_uri: Some(self.config.token_uri.clone()),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            scopes: self.scopes.clone(),
            expiry: Some(expiry),
        })
    }
}
