use clap::Parser;
use school_forum::{
    config::DatabaseConfig,
    db,
    repository::{SqlitePostRepository, SqliteUserRepository},
    seed,
};

/// Create the baseline admin, sample accounts and welcome posts.
#[derive(Parser, Debug)]
#[command(name = "seed", about = "Seed the school forum database")]
struct Args {
    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://forum.db?mode=rwc")]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_forum=info,seed=info".into()),
        )
        .init();

    let args = Args::parse();

    let pool = db::connect(&DatabaseConfig {
        url: args.database_url,
        max_connections: 1,
    }).await?;

    let users = SqliteUserRepository::new(pool.clone());
    let posts = SqlitePostRepository::new(pool);

    let report = seed::ensure_baseline(&users, &posts).await?;

    if report.is_empty() {
        tracing::info!("Nothing to do: baseline accounts already exist");
    } else {
        tracing::info!(
            "Created users {:?} and {} sample posts",
            report.users_created,
            report.posts_created
        );
    }

    Ok(())
}
