use std::time::Duration;

use anyhow::{Context, Result};

/// Engine configuration. Everything here is tunable without touching the
/// pagination algorithms: the completion threshold and the autosave window in
/// particular are policy, not mechanism.
///
/// `from_env` reads `FOLIO_*` variables with `Default` fallbacks, so an
/// embedding application can run with no environment at all.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// A page counts as `Complete` once its stripped length reaches
    /// `capacity × complete_ratio`.
    pub complete_ratio: f32,
    /// Idle window of the autosave debounce timer.
    pub autosave_idle: Duration,
    /// Hard timeout for one generation provider round trip.
    pub generation_timeout: Duration,
    /// How many stripped characters of the previous page are handed to the
    /// generation provider as continuity context.
    pub previous_tail_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            complete_ratio: 0.8,
            autosave_idle: Duration::from_millis(2_000),
            generation_timeout: Duration::from_secs(120),
            previous_tail_chars: 400,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Self::default();
        Ok(Self {
            complete_ratio: env_parse("FOLIO_COMPLETE_RATIO", defaults.complete_ratio)?,
            autosave_idle: Duration::from_millis(env_parse(
                "FOLIO_AUTOSAVE_MS",
                defaults.autosave_idle.as_millis() as u64,
            )?),
            generation_timeout: Duration::from_secs(env_parse(
                "FOLIO_GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )?),
            previous_tail_chars: env_parse(
                "FOLIO_PREVIOUS_TAIL_CHARS",
                defaults.previous_tail_chars,
            )?,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' is not a valid value")),
        Err(_) => Ok(default),
    }
}
