use crate::resolve::{PathResolver, PipelineConfig, ResolutionPipeline};
use crate::retry::{with_retry, RetryConfig};
use crate::slug::{NoiseVocabulary, SlugCleaner, StaleDateRange};
use crate::store::{DataStore, InMemoryStore, PostgresStore, PostgrestStore, StoreRelations};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Which backend serves lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgrest { url: String, api_key: String },
    Postgres { database_url: String },
    Memory { fixture: Option<PathBuf> },
}

impl StoreBackend {
    fn name(&self) -> &'static str {
        match self {
            StoreBackend::Postgrest { .. } => "postgrest",
            StoreBackend::Postgres { .. } => "postgres",
            StoreBackend::Memory { .. } => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Store
    pub store: StoreBackend,
    pub relations: StoreRelations,

    // Lookups
    pub lookup_timeout: Duration,
    pub retry_attempts: u32,
    pub max_alias_hops: usize,

    // Cleaning
    pub stale_dates: StaleDateRange,
    pub noise_words_file: Option<PathBuf>,

    // HTTP
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgrest".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "postgrest" => StoreBackend::Postgrest {
                url: std::env::var("STORE_URL").context("STORE_URL not set")?,
                api_key: std::env::var("STORE_API_KEY").context("STORE_API_KEY not set")?,
            },
            "postgres" => StoreBackend::Postgres {
                database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            },
            "memory" => StoreBackend::Memory {
                fixture: std::env::var("MEMORY_FIXTURE").ok().map(PathBuf::from),
            },
            other => bail!(
                "Unknown STORE_BACKEND '{}' (expected postgrest, postgres or memory)",
                other
            ),
        };

        let defaults = StoreRelations::default();
        let relations = StoreRelations {
            concert_view: env_or("CONCERT_VIEW", defaults.concert_view),
            festival_view: env_or("FESTIVAL_VIEW", defaults.festival_view),
            unified_view: env_or("UNIFIED_VIEW", defaults.unified_view),
            alias_table: env_or("ALIAS_TABLE", defaults.alias_table),
            target_table: env_or("TARGET_TABLE", defaults.target_table),
        };
        relations
            .validate()
            .context("Invalid store relation name in environment")?;

        Ok(Self {
            store,
            relations,

            lookup_timeout: Duration::from_millis(parsed_or("LOOKUP_TIMEOUT_MS", 3000)),
            // A single lightweight retry at most
            retry_attempts: parsed_or("LOOKUP_RETRY_ATTEMPTS", 2u32).clamp(1, 2),
            max_alias_hops: parsed_or("MAX_ALIAS_HOPS", 4),

            stale_dates: stale_dates_from_env()?,
            noise_words_file: std::env::var("NOISE_WORDS_FILE").ok().map(PathBuf::from),

            port: parsed_or("PORT", 8080),
        })
    }

    /// Cleaner with the configured vocabulary and stale-date window.
    pub fn build_cleaner(&self) -> Result<SlugCleaner> {
        build_cleaner(self.noise_words_file.as_ref(), self.stale_dates)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let lookup = RetryConfig::lookup();
        PipelineConfig {
            lookup_timeout: self.lookup_timeout,
            retry: RetryConfig::new(self.retry_attempts, lookup.initial_delay)
                .with_max_delay(lookup.max_delay),
            max_alias_hops: self.max_alias_hops,
            ..PipelineConfig::default()
        }
    }

    /// Connect the configured backend.
    pub async fn build_store(&self) -> Result<Arc<dyn DataStore>> {
        info!("Using {} store", self.store.name());

        let store: Arc<dyn DataStore> = match &self.store {
            StoreBackend::Postgrest { url, api_key } => Arc::new(PostgrestStore::new(
                url,
                api_key,
                self.relations.clone(),
                self.lookup_timeout,
            )?),
            StoreBackend::Postgres { database_url } => {
                let store = with_retry(&RetryConfig::startup(), "connect_postgres", || {
                    PostgresStore::connect(
                        database_url,
                        self.relations.clone(),
                        self.lookup_timeout,
                    )
                })
                .await?;
                Arc::new(store)
            }
            StoreBackend::Memory { fixture: Some(path) } => {
                Arc::new(InMemoryStore::from_json_file(path)?)
            }
            StoreBackend::Memory { fixture: None } => Arc::new(InMemoryStore::new()),
        };
        Ok(store)
    }

    /// Store, cleaner and pipeline wired into a request-level resolver.
    pub async fn build_resolver(&self) -> Result<PathResolver> {
        let store = self.build_store().await?;
        let pipeline = ResolutionPipeline::new(store)
            .with_cleaner(self.build_cleaner()?)
            .with_config(self.pipeline_config());
        Ok(PathResolver::new(pipeline))
    }
}

/// Cleaner configured from the environment alone; store settings are not
/// required. Used by tools that only clean slugs.
pub fn cleaner_from_env() -> Result<SlugCleaner> {
    let noise_words_file = std::env::var("NOISE_WORDS_FILE").ok().map(PathBuf::from);
    build_cleaner(noise_words_file.as_ref(), stale_dates_from_env()?)
}

fn build_cleaner(
    noise_words_file: Option<&PathBuf>,
    stale_dates: StaleDateRange,
) -> Result<SlugCleaner> {
    let vocabulary = match noise_words_file {
        Some(path) => NoiseVocabulary::from_file(path)?,
        None => NoiseVocabulary::default(),
    };
    let cleaner = SlugCleaner::new(vocabulary, stale_dates);
    info!(
        "Noise vocabulary: {} phrases, stale dates {}..={}",
        cleaner.vocabulary().len(),
        cleaner.stale_dates().min_year,
        cleaner.stale_dates().max_year
    );
    Ok(cleaner)
}

fn stale_dates_from_env() -> Result<StaleDateRange> {
    let defaults = StaleDateRange::default();
    let range = StaleDateRange::new(
        parsed_or("STALE_DATE_MIN_YEAR", defaults.min_year),
        parsed_or("STALE_DATE_MAX_YEAR", defaults.max_year),
    );
    if range.min_year > range.max_year {
        bail!(
            "STALE_DATE_MIN_YEAR ({}) is after STALE_DATE_MAX_YEAR ({})",
            range.min_year,
            range.max_year
        );
    }
    Ok(range)
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
