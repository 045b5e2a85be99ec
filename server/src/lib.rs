use clap::{Args, Parser};
use secrecy::SecretString;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use url::Url;

use self::auth::Keys;
use self::db::PgPool;

pub mod assistant;
pub mod auth;
pub mod daemon;
pub mod db;
pub mod endpoints;
pub mod error;

#[derive(Clone)]
pub struct AppContext {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub keys: Arc<Keys>,
    pub tx_sync_feeds: tokio::sync::watch::Sender<()>,
}

#[derive(Parser, Clone, Debug)]
#[command(version)]
pub struct Config {
    /// Signing secret for session tokens. The process refuses to start
    /// without one.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: SecretString,

    #[clap(flatten)]
    pub pg: PgParams,

    #[clap(flatten)]
    pub ollama: OllamaParams,

    #[clap(flatten)]
    pub feed: FeedParams,

    #[arg(long, env = "APP_BIND", default_value = "[::]:3000")]
    pub bind: SocketAddr,

    #[arg(long, env = "SPA_DIST")]
    pub spa_dist: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct OllamaParams {
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<Url>,

    #[arg(long, env = "OLLAMA_TEXT_MODEL")]
    pub ollama_text_model: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct FeedParams {
    #[arg(long, env = "THREAT_FEED_URL")]
    pub threat_feed_url: Option<Url>,

    #[arg(long, env = "THREAT_FEED_SOURCE", default_value = "feed")]
    pub threat_feed_source: String,
}

#[derive(Debug, Clone, Args)]
pub struct PgParams {
    #[clap(long, help = "Postgres host", env = "PG_HOST")]
    pg_host: String,

    #[clap(long, help = "Postgres port", env = "PG_PORT")]
    pg_port: u16,

    #[clap(long, help = "Postgres user", env = "PG_USER")]
    pg_user: SecretString,

    #[clap(long, help = "Postgres password", env = "PG_PASSWORD")]
    pg_password: SecretString,

    #[clap(long, help = "Postgres database", env = "PG_DATABASE")]
    pg_database: SecretString,

    #[clap(
        long,
        help = "Postgres connection pool max connections",
        env = "PG_MAX_CONNECTIONS"
    )]
    pub pg_max_connections: u8,
}
