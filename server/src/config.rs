use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Collision engine parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    /// Integration steps per frame; dt = 1 / substeps
    pub substeps: u32,
    /// Added to velocity.y per unit of dt
    pub gravity: f64,
    /// Velocity multiplier applied every substep
    pub damping: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            substeps: 8,
            gravity: 2.0,
            damping: 0.999,
        }
    }
}

impl PhysicsConfig {
    pub fn dt(&self) -> f64 {
        1.0 / self.substeps as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.substeps == 0 {
            return Err(ConfigError::Invalid("substeps must be > 0"));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Invalid("gravity must be finite"));
        }
        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping > 1.0 {
            return Err(ConfigError::Invalid("damping must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Wall-clock pause between simulation frames
    pub frame_interval_ms: u64,
    /// Upper bound on the global ball set
    pub max_balls: usize,
    /// Per-connection outbound queue; frames beyond it are dropped for that peer
    pub outbound_queue_len: usize,
    pub command_queue_len: usize,
    pub physics: PhysicsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            frame_interval_ms: 40,
            max_balls: 512,
            outbound_queue_len: 64,
            command_queue_len: 256,
            physics: PhysicsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `ARENA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("ARENA_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(v) = env_parse("ARENA_FRAME_INTERVAL_MS")? {
            config.frame_interval_ms = v;
        }
        if let Some(v) = env_parse("ARENA_MAX_BALLS")? {
            config.max_balls = v;
        }
        if let Some(v) = env_parse("ARENA_OUTBOUND_QUEUE_LEN")? {
            config.outbound_queue_len = v;
        }
        Ok(config)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.is_empty() {
            return Err(ConfigError::Invalid("listen_addr must not be empty"));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("frame_interval_ms must be > 0"));
        }
        if self.outbound_queue_len == 0 || self.command_queue_len == 0 {
            return Err(ConfigError::Invalid("queue lengths must be > 0"));
        }
        self.physics.validate()
    }
}

fn env_parse<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { name, value: raw }),
        Err(_) => Ok(None),
    }
}
