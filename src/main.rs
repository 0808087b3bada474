use brandcomm_bot::{
    cli::{Cli, Commands},
    config::LedgerBackend,
    error::Result,
    google::{GoogleAuth, OAuthFlow, TokenSource},
    storage, telegram, utils, BotError, Config,
};
use clap::Parser;
use colored::*;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brandcomm_bot=debug,info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.action() {
        Commands::Serve => {
            info!("Starting webhook server...");
            telegram::run_webhook(config).await
        }

        Commands::AuthUrl => print_auth_url(&config),

        Commands::Init => {
            info!("Initializing...");
            initialize(&config)
        }

        Commands::Deals { limit, format, chat } => list_deals(&config, *limit, format, *chat),

        Commands::Check => check(&config).await,
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?)
}

fn scopes(config: &Config) -> Vec<String> {
    config.google_scopes().into_iter().map(String::from).collect()
}

fn print_auth_url(config: &Config) -> Result<()> {
    let oauth = OAuthFlow::new(http_client()?, config.google.clone(), scopes(config));
    let url = oauth.authorization_url()?;
    println!("{}", "Open this URL to grant Drive access:".cyan());
    println!("{}", url);
    println!(
        "\nThe consent screen redirects to {}; copy the returned token_json into TOKEN_JSON.",
        config.google.redirect_uri.yellow()
    );
    Ok(())
}

fn initialize(config: &Config) -> Result<()> {
    println!("{}", "Initializing deal ledger...".green());
    let db = storage::Database::new(&config.ledger.sqlite_path)?;
    println!("{}", utils::ok_line("Database initialized"));
    println!("{}", utils::ok_line("Configuration loaded"));
    println!("\n{}", "Configuration:".cyan());
    println!("  Ledger:         {:?}", config.ledger.backend);
    println!("  SQLite path:    {}", config.ledger.sqlite_path);
    println!("  Deals stored:   {}", db.count_deals()?);
    println!("  Root folder:    {}", config.google.root_folder_id);
    println!("  Listen:         {}:{}", config.server.host, config.server.port);

    if config.ledger.backend != LedgerBackend::Sqlite {
        println!(
            "\n{}",
            "Note: ledger.backend is not 'sqlite', new deals will not be written here".yellow()
        );
    }

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to get Google consent", "brandcomm-bot auth-url".yellow());
    println!("  {} to start the webhook", "brandcomm-bot serve".yellow());
    Ok(())
}

fn list_deals(config: &Config, limit: usize, format: &str, chat: Option<i64>) -> Result<()> {
    let db = storage::Database::new(&config.ledger.sqlite_path)?;
    let deals = match chat {
        Some(chat_id) => {
            let mut deals = db.deals_for_chat(chat_id)?;
            deals.truncate(limit);
            deals
        }
        None => db.recent_deals(limit)?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&deals)?);
        return Ok(());
    }

    println!("{}", "=== Recorded Deals ===".cyan().bold());
    println!("Total: {}", db.count_deals()?);

    if deals.is_empty() {
        println!("{}", "No deals recorded yet".yellow());
        return Ok(());
    }

    let widths = [24, 20, 28, 40];
    utils::print_table_border(120);
    utils::print_table_row(&["Created", "Client", "Deal", "Folder"], &widths);
    utils::print_table_border(120);
    for deal in &deals {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&deal.created_at),
                &utils::shorten(&deal.client, 20),
                &utils::shorten(&deal.deal, 28),
                &deal.folder_link,
            ],
            &widths,
        );
    }
    utils::print_table_border(120);
    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    config.validate()?;
    println!("{}", utils::ok_line("Configuration valid"));

    match config.webhook_url() {
        Ok(url) => println!("{}", utils::ok_line(&format!("Webhook URL {}", url))),
        Err(e) => println!("{}", format!("✗ {}", e).yellow()),
    }

    let auth = GoogleAuth::new(http_client()?, config.google.clone(), scopes(config));
    match auth.access_token().await {
        Ok(_) => println!("{}", utils::ok_line("Google access token obtained")),
        Err(e @ BotError::OAuthNotCompleted(_)) => {
            println!("{}", format!("✗ {}", e).red());
            println!("  Run {} and finish the consent flow", "brandcomm-bot auth-url".yellow());
            return Err(e);
        }
        Err(e) => return Err(e),
    }

    if config.openai.api_key.is_none() {
        println!("{}", "OPENAI_API_KEY is not set, free text gets a setup hint".yellow());
    }
    Ok(())
}
