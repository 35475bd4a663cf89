use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use albook::config::{ServeConfig, StoreConfig};
use albook::{api, db, service};

#[derive(Parser)]
#[command(name = "albook")]
#[command(about = "Spaced-repetition review tracker for solved exercises")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    // Server settings used when no subcommand is given.
    #[command(flatten)]
    serve: ServeConfig,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve(ServeConfig),
    /// Print dashboard counts
    Stats(StoreConfig),
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "albook=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(config: &StoreConfig) -> anyhow::Result<db::Database> {
    let db = db::Database::open(&config.db_path)?;
    db.migrate()?;
    tracing::info!("Using database: {}", config.db_path.display());
    Ok(db)
}

async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let db = open_database(&config.store)?;

    let mut app = api::create_router(db);
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        app = api::with_static_dir(app, dir);
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("albook server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve(config)) => serve(config).await?,
        Some(Commands::Stats(config)) => {
            let db = open_database(&config)?;
            let stats = service::stats(&db, Utc::now())?;
            println!("Pending:        {}", stats.pending_count);
            println!("Pool:           {}", stats.pool_count);
            println!("Reviewed today: {}", stats.reviewed_today_count);
            println!("Solved today:   {}", stats.solved_today_count);
            println!("Total:          {}", stats.total_count);
        }
        // Default: start server
        None => serve(cli.serve).await?,
    }

    Ok(())
}
