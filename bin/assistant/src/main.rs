use rootcause::Report;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_assistant::{AssistantConfig, PgConversationStore, Repl, StartupError};
use travel_assistant_ai::OpenAiGateway;
use travel_assistant_conversation::{ConversationStore, InMemoryConversationStore, TurnEngine};
use travel_assistant_travel::{FileTravelData, InMemoryTravelData, TravelDataSource};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!("{report}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Report<StartupError>> {
    let config = AssistantConfig::from_env().map_err(|e| StartupError::Config {
        details: e.to_string(),
    })?;
    let gateway = OpenAiGateway::new(config.llm.clone()).map_err(|e| StartupError::Gateway {
        details: e.to_string(),
    })?;
    tracing::info!(model = %gateway.model(), user_id = %config.user_id, "Loaded configuration");
    let data = travel_data(&config).await?;

    let pool = match &config.database_url {
        Some(url) => Some(connect(url).await?),
        None => {
            tracing::info!("No DATABASE_URL set, conversations are kept in memory");
            None
        }
    };
    let store: Arc<dyn ConversationStore> = match &pool {
        Some(pool) => Arc::new(PgConversationStore::new(pool.clone())),
        None => Arc::new(InMemoryConversationStore::new()),
    };

    let mut engine = TurnEngine::new(store, gateway, data);
    if let Some(window) = config.history_window {
        engine = engine.with_history_window(window);
    }
    let engine = Arc::new(engine);
    let repl = Repl::new(Arc::clone(&engine), config.user());

    let mut stdout = tokio::io::stdout();
    let result = tokio::select! {
        result = repl.run(BufReader::new(tokio::io::stdin()), &mut stdout) => {
            result.map_err(|e| StartupError::Io { details: e.to_string() })
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(())
        }
    };

    // An interrupted REPL may leave a turn running; it must persist first.
    engine.drain().await;
    if let Some(pool) = pool {
        pool.close().await;
    }
    result?;
    Ok(())
}

async fn travel_data(config: &AssistantConfig) -> Result<Arc<dyn TravelDataSource>, StartupError> {
    let Some(path) = &config.travel_data_path else {
        tracing::info!("No TRAVEL_DATA_PATH set, using sample travel data");
        return Ok(Arc::new(InMemoryTravelData::sample()));
    };

    // Fail fast on an unreadable file; later faults are contained per lookup.
    let data = FileTravelData::new(path);
    data.hotels().await.map_err(|e| StartupError::TravelData {
        details: e.to_string(),
    })?;
    tracing::info!(path = %data.path().display(), "Using travel data file");
    Ok(Arc::new(data))
}

async fn connect(url: &str) -> Result<PgPool, StartupError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StartupError::Migration {
            details: e.to_string(),
        })?;

    Ok(pool)
}
