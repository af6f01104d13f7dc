//! Slug audit binary - shows what the cleaner would do to a list of slugs
//!
//! Usage:
//!   cargo run --bin audit_slugs -- slugs.txt         # One slug per line
//!   cat slugs.txt | cargo run --bin audit_slugs      # Read from stdin
//!   cargo run --bin audit_slugs -- --json slugs.txt  # JSON lines output
//!
//! Optional environment variables:
//! - NOISE_WORDS_FILE (defaults to the built-in vocabulary)
//! - STALE_DATE_MIN_YEAR / STALE_DATE_MAX_YEAR (defaults to 2000 / last year)

use anyhow::{Context, Result};
use slug_resolver::config::cleaner_from_env;
use slug_resolver::slug::{ClassEvidence, RouteClassifier};
use std::io::{BufRead, BufReader, Read};
use tracing::info;

fn main() -> Result<()> {
    // Load environment from .env file
    dotenvy::dotenv().ok();

    // Initialize logging (stderr, so stdout stays machine readable)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slug_resolver=info".parse()?),
        )
        .init();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|arg| arg == "--json");
    let file = args.iter().find(|arg| !arg.starts_with("--"));

    let cleaner = cleaner_from_env()?;
    let classifier = RouteClassifier::default();

    let input: Box<dyn Read> = match file {
        Some(path) => Box::new(
            std::fs::File::open(path).with_context(|| format!("Failed to open {}", path))?,
        ),
        None => Box::new(std::io::stdin()),
    };

    let mut total = 0usize;
    let mut changed = 0usize;
    let mut collapsed = 0usize;

    for line in BufReader::new(input).lines() {
        let line = line.context("Failed to read input")?;
        let raw = line.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        total += 1;

        let cleaned = cleaner.clean(raw);
        if cleaned.collapsed_to_empty {
            collapsed += 1;
        }
        if !cleaned.changed {
            continue;
        }
        changed += 1;

        let class = classifier.classify(ClassEvidence::Slug(&cleaned.cleaned));
        if json {
            let mut record = serde_json::to_value(&cleaned)?;
            record["class"] = serde_json::Value::String(class.to_string());
            println!("{}", record);
        } else {
            println!("{} -> {} [{}]", cleaned.raw, cleaned.cleaned, class);
        }
    }

    info!(
        "Audited {} slugs: {} would change, {} clean to nothing",
        total, changed, collapsed
    );
    Ok(())
}
