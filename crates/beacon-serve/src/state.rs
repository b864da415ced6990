//! Application state and configuration.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use beacon_core::{IngestPipeline, PepperedHasher};
use beacon_store::SqliteStore;

use crate::cache::{ResponseCache, new_cache};
use crate::mailer::Mailer;

/// Default byte ceiling for JSON body beacons (200 KiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 200 * 1024;

/// Default byte ceiling for query-parameter beacons (50 KiB).
pub const DEFAULT_QUERY_LIMIT_BYTES: usize = 50 * 1024;

/// Outbound mail delivery settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP mail API endpoint.
    pub api_url: String,
    /// Sender address.
    pub from: String,
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Path to the SQLite database file.
    pub db_path: PathBuf,

    /// Secret pepper mixed into every digest. Required and non-empty.
    pub pepper: String,

    /// Byte ceiling for the canonical payload of JSON body beacons.
    pub body_limit_bytes: usize,

    /// Byte ceiling for the canonical payload of query-parameter beacons.
    pub query_limit_bytes: usize,

    /// Outbound mail settings; `None` disables registration mail.
    pub mail: Option<MailConfig>,

    /// Lowercased email domains refused at registration.
    pub email_blocklist: HashSet<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `BEACON_PEPPER`: secret pepper for identity and content hashing
    ///
    /// Optional environment variables:
    /// - `BEACON_BIND_ADDR`: server bind address (default: "0.0.0.0:8080")
    /// - `BEACON_DB_PATH`: SQLite path (default: "./data/beacon.db")
    /// - `BEACON_BODY_LIMIT_BYTES`: body beacon ceiling (default: 204800)
    /// - `BEACON_QUERY_LIMIT_BYTES`: query beacon ceiling (default: 51200)
    /// - `BEACON_MAIL_API_URL` + `BEACON_MAIL_FROM`: enable registration mail
    /// - `BEACON_EMAIL_BLOCKLIST`: comma-separated refused domains
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("BEACON_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let db_path = std::env::var("BEACON_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/beacon.db"));

        let pepper = std::env::var("BEACON_PEPPER")
            .map_err(|_| anyhow::anyhow!("BEACON_PEPPER environment variable is required"))?;
        if pepper.trim().is_empty() {
            anyhow::bail!("BEACON_PEPPER must not be empty");
        }

        let body_limit_bytes = env_limit("BEACON_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?;
        let query_limit_bytes = env_limit("BEACON_QUERY_LIMIT_BYTES", DEFAULT_QUERY_LIMIT_BYTES)?;

        let mail = match (
            std::env::var("BEACON_MAIL_API_URL"),
            std::env::var("BEACON_MAIL_FROM"),
        ) {
            (Ok(api_url), Ok(from)) => Some(MailConfig { api_url, from }),
            (Err(_), Err(_)) => None,
            _ => anyhow::bail!("BEACON_MAIL_API_URL and BEACON_MAIL_FROM must be set together"),
        };

        let email_blocklist: HashSet<String> = std::env::var("BEACON_EMAIL_BLOCKLIST")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        tracing::info!(
            bind_addr = %bind_addr,
            db_path = %db_path.display(),
            body_limit_bytes,
            query_limit_bytes,
            mail_enabled = mail.is_some(),
            blocklist_domains = email_blocklist.len(),
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            db_path,
            pepper,
            body_limit_bytes,
            query_limit_bytes,
            mail,
            email_blocklist,
        })
    }
}

fn env_limit(key: &str, default: usize) -> anyhow::Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("{key} must be a byte count, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The log store; sole path to persistent state.
    pub store: SqliteStore,

    /// Ingestion pipeline for beacon submissions.
    pub pipeline: IngestPipeline,

    /// Digest function for auth lookups and registration.
    pub hasher: PepperedHasher,

    /// Application configuration.
    pub config: Arc<Config>,

    /// Server-side cache for aggregate responses.
    pub count_cache: ResponseCache,

    /// Registration mail sender, when configured.
    pub mailer: Option<Mailer>,
}

impl AppState {
    /// Open the store at the configured path and build the state.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = SqliteStore::open(&config.db_path)?;
        Self::with_store(config, store)
    }

    /// Build state over an existing store. Tests use this with an in-memory
    /// store.
    pub fn with_store(config: Config, store: SqliteStore) -> anyhow::Result<Self> {
        let hasher = PepperedHasher::new(config.pepper.clone())?;
        let mailer = config.mail.as_ref().map(Mailer::new);
        Ok(Self {
            store,
            pipeline: IngestPipeline::new(hasher.clone()),
            hasher,
            config: Arc::new(config),
            count_cache: new_cache(),
            mailer,
        })
    }
}
