use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payment_gateway_core::adapters::{
    PostgresTransactionRepository, RedisQueuePublisher, RedisStatusCache,
};
use payment_gateway_core::cli::{self, Cli, Commands, DbCommands, TxCommands};
use payment_gateway_core::config::Config;
use payment_gateway_core::health::{
    DependencyChecker, PostgresChecker, PublisherChecker, RedisChecker,
};
use payment_gateway_core::ports::{StatusCache, TransactionPublisher, TransactionRepository};
use payment_gateway_core::resilience::CircuitBreaker;
use payment_gateway_core::services::{DualWriteCoordinator, StatusResolver, TransactionPipeline};
use payment_gateway_core::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Tx(TxCommands::Status { tx_id }) => cli::handle_tx_status(&config, &tx_id).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    // Database pool
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    // Redis status cache and publish queue
    let cache = RedisStatusCache::connect(&config.redis_url).await?;
    let publisher = RedisQueuePublisher::connect(&config.redis_url, config.publish_queue.clone()).await?;
    let redis_health = RedisChecker::new(
        redis::Client::open(config.redis_url.as_str())?
            .get_multiplexed_async_connection()
            .await?,
    );

    let store: Arc<dyn TransactionRepository> = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let cache: Arc<dyn StatusCache> = Arc::new(cache);
    let publisher: Arc<dyn TransactionPublisher> = Arc::new(publisher);

    // One breaker for the publish dependency, shared by every request
    let breaker = Arc::new(CircuitBreaker::new("publisher", config.breaker_config()));

    let coordinator = DualWriteCoordinator::new(store.clone(), cache.clone());
    let resolver = Arc::new(StatusResolver::cache_then_store(cache, store));
    let pipeline = Arc::new(TransactionPipeline::new(
        coordinator,
        resolver,
        publisher,
        breaker.clone(),
        config.publish_retry_policy(),
    ));

    let health_checks: Vec<Arc<dyn DependencyChecker>> = vec![
        Arc::new(PostgresChecker::new(pool)),
        Arc::new(redis_health),
        Arc::new(PublisherChecker::new(breaker)),
    ];

    let app_state = AppState {
        health_checks: Arc::new(health_checks),
        callback_secret: config.callback_secret.clone(),
        ..AppState::new(pipeline)
    };
    let app = create_app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
