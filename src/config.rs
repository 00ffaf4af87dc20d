//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::logic::explain::ExplainConfig;
use crate::logic::present::{DEFAULT_TOP_N, MAX_TOP_N, MIN_TOP_N};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Serialized model artifact (.json linear coefficients or .onnx)
    pub model_path: PathBuf,

    /// Expected SHA-256 of the model artifact (hex)
    pub model_sha256: Option<String>,

    /// Background reference data
    pub reference_path: PathBuf,

    /// Reference data delimiter
    pub reference_delimiter: u8,

    /// Cap on reference rows kept for attribution (0 = keep all)
    pub reference_max_rows: usize,

    /// Sampled permutations per explanation (at least 1)
    pub explain_permutations: usize,

    /// Sampling seed
    pub explain_seed: u64,

    /// Fields shown in the waterfall before folding (1..=50)
    pub top_n: usize,

    /// Decorative image shown above the form
    pub image_path: Option<PathBuf>,

    /// Environment (development, production)
    pub environment: String,

    /// Log output: "pretty" or "json"
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            model_path: non_empty("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("model/reg_model.json")),

            model_sha256: non_empty("MODEL_SHA256"),

            reference_path: non_empty("REFERENCE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/reference.csv")),

            reference_delimiter: non_empty("REFERENCE_DELIMITER")
                .and_then(|d| single_byte(&d))
                .unwrap_or(b';'),

            reference_max_rows: non_empty("REFERENCE_MAX_ROWS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(100),

            explain_permutations: non_empty("EXPLAIN_PERMUTATIONS")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n >= 1)
                .unwrap_or(ExplainConfig::default().permutations),

            explain_seed: non_empty("EXPLAIN_SEED")
                .and_then(|n| n.parse().ok())
                .unwrap_or(ExplainConfig::default().seed),

            top_n: non_empty("EXPLAIN_TOP_N")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (MIN_TOP_N..=MAX_TOP_N).contains(n))
                .unwrap_or(DEFAULT_TOP_N),

            image_path: non_empty("IMAGE_PATH").map(PathBuf::from),

            environment: non_empty("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),

            log_format: non_empty("LOG_FORMAT")
                .unwrap_or_else(|| "pretty".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn explain_config(&self) -> ExplainConfig {
        ExplainConfig {
            permutations: self.explain_permutations,
            seed: self.explain_seed,
            ..ExplainConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// `";"` → `b';'`, `"\t"` or `"tab"` → tab
fn single_byte(s: &str) -> Option<u8> {
    match s {
        "\\t" | "tab" => Some(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => s.bytes().next(),
        _ => None,
    }
}
