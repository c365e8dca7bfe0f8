use clap::Parser;
use kitchen::{
    api::{handlers::AppState, routes},
    cli::{commands, Cli, Commands, UsersCommand},
    config::Settings,
    db, Error, KitchenAssistant, Result,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kitchen=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::from_env()?;
    settings.validate()?;

    match cli.command {
        Commands::Build { corpus, index_dir } => {
            if let Some(corpus) = corpus {
                settings.corpus.path = corpus;
            }
            if let Some(index_dir) = index_dir {
                settings.index.dir = index_dir;
            }
            commands::build(&settings, &settings.corpus.path, &settings.index.dir).await?;
        }
        Commands::Ask {
            query,
            server,
            remote,
        } => match server {
            Some(server_url) => commands::ask_remote(&server_url, &query).await?,
            None if remote => commands::ask_remote(&settings.server_url(), &query).await?,
            None => commands::ask(&settings, &query).await?,
        },
        Commands::Serve { port, host } => {
            serve(settings, port, host).await?;
        }
        Commands::Users {
            command: UsersCommand::Export { output },
        } => {
            let output = output.unwrap_or_else(|| settings.database.users_csv_path.clone());
            commands::export_users(&settings, &output).await?;
        }
    }

    Ok(())
}

async fn serve(mut settings: Settings, port: Option<u16>, host: Option<String>) -> Result<()> {
    // Override settings with CLI arguments
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }

    info!("Starting Kitchen Assistant server");
    info!("Database: {}", settings.database.url);
    info!("Corpus: {}", settings.corpus.path.display());
    info!("Index: {}", settings.index.dir.display());

    let pool = db::init_pool_with_config(&settings.database).await?;
    info!(
        "Database connection established (max_connections: {})",
        settings.database.max_connections
    );

    let assistant = Arc::new(KitchenAssistant::from_settings(&settings)?);

    // Warm the index in the background; queries arriving first wait on the same load
    let warm = assistant.clone();
    tokio::spawn(async move {
        if let Err(e) = warm.index().await {
            warn!("Recipe index not ready: {}", e.log_safe());
        }
    });

    let state = AppState {
        pool,
        assistant,
        settings: settings.clone(),
    };

    let app = routes::create_router(state, &settings);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    println!("\n========================================");
    println!("Kitchen Assistant Server");
    println!("========================================");
    println!("Address: http://{addr}");
    println!("Embedding model: {}", settings.index.embedding_model);
    println!("\nAPI Endpoints:");
    println!("  GET  /api/recipe?q=...");
    println!("  POST /api/signup");
    println!("  POST /api/login");
    println!("  GET  /health");
    println!("  GET  /ready");
    println!("\nPress Ctrl+C to stop");
    println!("========================================\n");

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}
