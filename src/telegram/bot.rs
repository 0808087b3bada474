use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    update_listeners::webhooks,
    utils::command::BotCommands,
};
use std::sync::Arc;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::deal::{self, DealService, SessionStore};
use crate::error::{BotError, Result};
use crate::google::{DriveClient, GoogleAuth, OAuthFlow, TokenSource};
use crate::ledger;
use tracing::{info, warn};

/// State shared across all bot handlers and HTTP routes
pub struct BotState {
    pub config: Config,
    pub sessions: SessionStore,
    pub deals: DealService,
    pub assistant: Assistant,
    pub auth: Arc<GoogleAuth>,
    pub oauth: OAuthFlow,
}

impl BotState {
    /// Wires the Google, ledger and LLM clients from configuration. Makes no network calls.
    pub fn from_config(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let scopes: Vec<String> = config.google_scopes().into_iter().map(String::from).collect();
        let auth = Arc::new(GoogleAuth::new(http.clone(), config.google.clone(), scopes.clone()));
        let token_source: Arc<dyn TokenSource> = auth.clone();

        let drive = Arc::new(DriveClient::new(http.clone(), token_source.clone(), &config.google));
        let ledger = ledger::from_config(&config, http.clone(), token_source)?;
        let deals = DealService::new(drive, ledger, config.google.root_folder_id.clone());

        Ok(Self {
            sessions: SessionStore::new(),
            deals,
            assistant: Assistant::new(http.clone(), &config.openai),
            oauth: OAuthFlow::new(http, config.google.clone(), scopes),
            auth,
            config,
        })
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Команды:")]
pub enum Command {
    #[command(description = "как пользоваться ботом")]
    Start,
    #[command(description = "список команд")]
    Help,
    #[command(description = "показать активную сделку и подпапку")]
    Where,
    #[command(description = "выбрать подпапку для файлов, например /to 05")]
    To(String),
}

/// Routing for message and edited_message updates; everything else is ignored.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    let messages = dptree::entry()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(crate::telegram::commands::answer),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(|t| deal::is_deal_request(t.trim_start())))
                .endpoint(crate::telegram::handlers::create_deal),
        )
        .branch(
            dptree::filter(|msg: Message| msg.document().is_some() || msg.photo().is_some())
                .endpoint(crate::telegram::handlers::upload_attachment),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(|t| !t.trim().is_empty()))
                .endpoint(crate::telegram::handlers::chat),
        );

    dptree::entry()
        .branch(Update::filter_message().chain(messages.clone()))
        .branch(Update::filter_edited_message().chain(messages))
}

/// Registers the webhook with Telegram and serves it next to the HTTP routes.
pub async fn run_webhook(config: Config) -> Result<()> {
    config.validate()?;

    let addr = config.listen_addr()?;
    let url = config.webhook_url()?;
    let state = Arc::new(BotState::from_config(config)?);

    info!("Starting Telegram bot (webhook {})...", url);
    if !state.assistant.is_enabled() {
        warn!("OPENAI_API_KEY is not set, free text gets a setup hint");
    }

    let bot = Bot::new(state.config.telegram.bot_token.clone());

    let mut options = webhooks::Options::new(addr, url);
    if let Some(secret) = &state.config.telegram.secret_token {
        options = options.secret_token(secret.clone());
    }

    let (listener, stop_flag, webhook_router) = webhooks::axum_to_router(bot.clone(), options).await?;
    let app = crate::server::router(state.clone()).merge(webhook_router);

    let tcp = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let server = tokio::spawn(async move {
        axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await
    });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    server
        .await
        .map_err(|e| BotError::Other(e.into()))??;

    info!("Telegram bot stopped");
    Ok(())
}
