//! Noise vocabulary: marketing and service tokens that never identify an
//! event.
//!
//! Phrases are matched as whole hyphen-delimited token sequences, so
//! `vip` removes `...-vip-...` but leaves `vipassana` alone.

use crate::slug::normalize::normalize;
use anyhow::{Context, Result};
use std::path::Path;

/// Ticket-type words
const TICKET_WORDS: &[&str] = &[
    "entradas", "entrada", "tickets", "ticket", "boletos", "boleto", "abono", "abonos",
    "vip", "pista", "grada", "palco", "general", "reducida",
];

/// Transport and service words
const SERVICE_WORDS: &[&str] = &[
    "parking", "bus", "autobus", "shuttle", "transfer", "traslado", "transporte",
    "lanzadera", "camping", "guardarropa", "taquilla",
];

/// Tier words
const TIER_WORDS: &[&str] = &["gold", "platinum", "silver", "premium", "diamond", "golden"];

/// Stale campaign words
const CAMPAIGN_WORDS: &[&str] = &[
    "black-friday", "cyber-monday", "preventa", "presale", "early-bird", "oferta",
    "ofertas", "promo", "descuento", "last-minute", "ultima-hora",
];

/// Data-driven list of noise phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseVocabulary {
    /// Tokenized phrases, longest first
    phrases: Vec<Vec<String>>,
}

impl NoiseVocabulary {
    /// Build a vocabulary from arbitrary words or hyphenated phrases.
    ///
    /// Entries are normalized the same way slugs are; entries that normalize
    /// to nothing are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<Vec<String>> = words
            .into_iter()
            .map(|word| normalize(word.as_ref()))
            .filter(|word| !word.is_empty())
            .map(|word| word.split('-').map(str::to_string).collect())
            .collect();

        phrases.sort_by(|a: &Vec<String>, b: &Vec<String>| b.len().cmp(&a.len()).then(a.cmp(b)));
        phrases.dedup();

        Self { phrases }
    }

    /// Load a vocabulary from a newline-delimited file.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read noise vocabulary from {}", path.display()))?;

        let words: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        if words.is_empty() {
            anyhow::bail!("Noise vocabulary file {} has no entries", path.display());
        }

        Ok(Self::from_words(words))
    }

    /// An empty vocabulary (noise removal becomes a no-op).
    pub fn empty() -> Self {
        Self {
            phrases: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Remove every noise phrase from a normalized slug.
    pub fn strip(&self, slug: &str) -> String {
        let tokens: Vec<&str> = slug.split('-').filter(|t| !t.is_empty()).collect();
        let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut index = 0;

        while index < tokens.len() {
            let matched = self
                .phrases
                .iter()
                .find(|phrase| starts_with_phrase(&tokens[index..], phrase));

            match matched {
                Some(phrase) => index += phrase.len(),
                None => {
                    kept.push(tokens[index]);
                    index += 1;
                }
            }
        }

        kept.join("-")
    }
}

impl Default for NoiseVocabulary {
    fn default() -> Self {
        Self::from_words(
            TICKET_WORDS
                .iter()
                .chain(SERVICE_WORDS)
                .chain(TIER_WORDS)
                .chain(CAMPAIGN_WORDS),
        )
    }
}

fn starts_with_phrase(tokens: &[&str], phrase: &[String]) -> bool {
    tokens.len() >= phrase.len() && tokens.iter().zip(phrase).all(|(token, word)| token == word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_strips_service_words() {
        let vocabulary = NoiseVocabulary::default();
        assert_eq!(vocabulary.strip("bad-bunny-madrid-parking"), "bad-bunny-madrid");
        assert_eq!(vocabulary.strip("rosalia-tickets-barcelona"), "rosalia-barcelona");
    }

    #[test]
    fn test_multi_token_phrase() {
        let vocabulary = NoiseVocabulary::default();
        assert_eq!(vocabulary.strip("black-friday-coldplay"), "coldplay");
        // Only the whole phrase is noise
        assert_eq!(vocabulary.strip("black-sabbath"), "black-sabbath");
    }

    #[test]
    fn test_whole_tokens_only() {
        let vocabulary = NoiseVocabulary::default();
        assert_eq!(vocabulary.strip("vipassana-retiro"), "vipassana-retiro");
        assert_eq!(vocabulary.strip("goldfrapp-madrid"), "goldfrapp-madrid");
    }

    #[test]
    fn test_all_noise_yields_empty() {
        let vocabulary = NoiseVocabulary::default();
        assert_eq!(vocabulary.strip("vip-parking-gold"), "");
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = NoiseVocabulary::from_words(["Merch", "meet-and-greet"]);
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(
            vocabulary.strip("aitana-meet-and-greet-merch-valencia"),
            "aitana-valencia"
        );
        // Default words are not part of a custom vocabulary
        assert_eq!(vocabulary.strip("aitana-vip"), "aitana-vip");
    }

    #[test]
    fn test_empty_vocabulary_is_noop() {
        let vocabulary = NoiseVocabulary::empty();
        assert!(vocabulary.is_empty());
        assert_eq!(vocabulary.strip("a-vip-b"), "a-vip-b");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "# service words").unwrap();
        writeln!(file, "parking").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Hotel  ").unwrap();

        let vocabulary = NoiseVocabulary::from_file(file.path()).expect("load");
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.strip("hotel-parking-sevilla"), "sevilla");
    }

    #[test]
    fn test_from_file_missing() {
        let result = NoiseVocabulary::from_file("/nonexistent/noise.txt");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_without_entries() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "# nothing here").unwrap();
        assert!(NoiseVocabulary::from_file(file.path()).is_err());
    }
}
