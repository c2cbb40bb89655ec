//! Layered configuration: defaults, an optional TOML file, then `SAGA__*`
//! environment variables.

use config::{Config, Environment, File};
use saga_cache::CacheConfig;
use saga_core::{GameSettings, TurnContext};
use saga_error::{ConfigError, SagaResult};
use saga_interface::NarrativeDriver;
use saga_models::{AnthropicClient, DEFAULT_MODEL, OfflineDriver};
use saga_narrative::{GameSession, HandlerRegistry, NarrativeService, TurnExecutor};
use saga_retry::{CircuitBreaker, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// How the generation service is reached and how patiently it is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model identifier
    pub model: String,
    /// Default completion token cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Override for the provider endpoint
    pub base_url: Option<String>,
    /// Deadline for one attempt, in seconds
    pub attempt_timeout_secs: u64,
    /// Retry policy around each call
    pub retry: RetryPolicy,
    /// Consecutive provider faults before the breaker opens
    pub breaker_failure_threshold: usize,
    /// Seconds the breaker stays open
    pub breaker_cooldown_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            base_url: None,
            attempt_timeout_secs: 30,
            retry: RetryPolicy::default(),
            breaker_failure_threshold: 5,
            breaker_cooldown_secs: 30,
        }
    }
}

/// Turn execution limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Deadline for one handler, retries included, in seconds
    pub handler_timeout_secs: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            handler_timeout_secs: 120,
        }
    }
}

/// Everything a game needs to start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SagaConfig {
    /// Game rules
    pub game: GameSettings,
    /// Generation service
    pub generation: GenerationSettings,
    /// Scene cache
    pub cache: CacheConfig,
    /// Turn execution
    pub orchestrator: OrchestratorSettings,
}

impl SagaConfig {
    /// `<config dir>/saga/saga.toml`, when the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("saga").join("saga.toml"))
    }

    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is read
    /// if present. `SAGA__GAME__TOTAL_TURNS=20` style variables override both.
    ///
    /// # Errors
    ///
    /// Returns a config error when the file is missing or malformed, or a
    /// value has the wrong type.
    #[instrument(skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> SagaResult<Self> {
        let mut builder = Config::builder();
        match path {
            Some(path) => {
                debug!("Reading configuration file");
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(default) = Self::default_path() {
                    debug!(path = %default.display(), "Reading default configuration file if present");
                    builder = builder.add_source(File::from(default).required(false));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("SAGA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: SagaConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::new(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        info!(
            world = %config.game.world_name,
            total_turns = config.game.total_turns,
            model = %config.generation.model,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reject settings no game can run with.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the offending setting.
    pub fn validate(&self) -> SagaResult<()> {
        if self.game.total_turns == 0 {
            return Err(ConfigError::new("game.total_turns must be at least 1").into());
        }
        if self.game.turns_per_stage == 0 {
            return Err(ConfigError::new("game.turns_per_stage must be at least 1").into());
        }
        if self.game.max_health <= 0 {
            return Err(ConfigError::new("game.max_health must be positive").into());
        }
        Ok(())
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns a config error if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> SagaResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)).into())
    }

    /// The generation service for this configuration.
    ///
    /// Runs offline when asked to, or when no API key is set.
    pub fn build_service(&self, offline: bool) -> Arc<NarrativeService> {
        let driver: Arc<dyn NarrativeDriver> = if offline {
            info!("Running offline, every step uses local fallbacks");
            Arc::new(OfflineDriver)
        } else {
            match std::env::var(API_KEY_ENV) {
                Ok(key) if !key.trim().is_empty() => Arc::new(self.anthropic_client(key)),
                _ => {
                    warn!(
                        variable = API_KEY_ENV,
                        "No API key configured, running offline"
                    );
                    Arc::new(OfflineDriver)
                }
            }
        };

        let generation = &self.generation;
        Arc::new(
            NarrativeService::new(driver)
                .with_retry(generation.retry.clone())
                .with_attempt_timeout(Duration::from_secs(generation.attempt_timeout_secs))
                .with_breaker(CircuitBreaker::new(
                    generation.breaker_failure_threshold,
                    1,
                    Duration::from_secs(generation.breaker_cooldown_secs),
                )),
        )
    }

    fn anthropic_client(&self, key: String) -> AnthropicClient {
        let generation = &self.generation;
        let client = AnthropicClient::new(key, &generation.model)
            .with_max_tokens(generation.max_tokens)
            .with_temperature(generation.temperature);
        match &generation.base_url {
            Some(url) => client.with_base_url(url.clone()),
            None => client,
        }
    }

    /// A new game with every standard handler.
    pub fn new_session(&self, seed: Option<u64>, offline: bool) -> GameSession {
        let service = self.build_service(offline);
        let registry = HandlerRegistry::standard(service.clone(), &self.game, self.cache.clone());
        GameSession::with_registry(
            self.game.clone(),
            service,
            registry,
            TurnContext::new(seed),
        )
        .with_executor(
            TurnExecutor::new()
                .with_handler_timeout(Duration::from_secs(self.orchestrator.handler_timeout_secs)),
        )
    }
}
