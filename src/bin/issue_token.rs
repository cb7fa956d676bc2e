use clap::Parser;
use dotenvy::dotenv;
use rust_media_backend::config::AppConfig;
use rust_media_backend::utils::auth::create_jwt_with_ttl;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mint a bearer token for local testing of the upload endpoints
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// User id placed in the `sub` claim
    #[arg(short, long)]
    user: String,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 24)]
    hours: i64,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "issue_token=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env();
    let token = create_jwt_with_ttl(
        &args.user,
        &config.jwt_secret,
        chrono::Duration::hours(args.hours),
    )?;

    info!("🔑 Issued token for user '{}' valid for {}h", args.user, args.hours);
    println!("{}", token);
    Ok(())
}
