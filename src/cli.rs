use clap::{Parser, Subcommand};

use crate::adapters::{PostgresTransactionRepository, RedisStatusCache};
use crate::config::Config;
use crate::ports::{CacheError, StatusCache, TransactionRepository};

#[derive(Parser)]
#[command(name = "payment-gateway-core")]
#[command(about = "Payment gateway - transaction intake, status and callback processor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction inspection commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Show the stored and cached status of a transaction
    Status {
        #[arg(value_name = "TX_ID")]
        tx_id: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

/// Prints both views so a stale cache entry is visible.
pub async fn handle_tx_status(config: &Config, tx_id: &str) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;
    let store = PostgresTransactionRepository::new(pool);
    let tx = store.get_by_id(tx_id).await?;

    println!("Transaction {}", tx.transaction_id);
    println!("  Kind:        {}", tx.kind);
    println!("  Amount:      {}", tx.amount);
    println!("  Created at:  {}", tx.created_at.to_rfc3339());
    println!("  Data format: {}", tx.data_format);
    println!("  Status:      {}", tx.status);

    match RedisStatusCache::connect(&config.redis_url).await {
        Ok(cache) => match cache.get_status(tx_id).await {
            Ok(cached) if cached == tx.status => println!("  Cache:       {} (in sync)", cached),
            Ok(cached) => println!("  Cache:       {} (stale)", cached),
            Err(CacheError::Miss(_)) => println!("  Cache:       <miss>"),
            Err(e) => println!("  Cache:       <error: {}>", e),
        },
        Err(e) => println!("  Cache:       <unreachable: {}>", e),
    }

    Ok(())
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed");

    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Redis URL: {}", mask_password(&config.redis_url));
    println!("  Publish Queue: {}", config.publish_queue);
    println!("  Publish Attempts: {}", config.publish_max_attempts);
    println!(
        "  Circuit Breaker: {} failures, {}s cool-down",
        config.breaker_failure_threshold, config.breaker_cool_down_secs
    );
    println!(
        "  Callback Signatures: {}",
        if config.callback_secret.is_some() { "required" } else { "disabled" }
    );

    config.validate()?;

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
