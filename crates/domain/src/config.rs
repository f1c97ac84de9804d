//! Service configuration loaded from environment variables.

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `EVENT_COMMAND_MAX_ATTEMPTS` — load-mutate-save attempts per command before
///   a concurrency conflict is returned to the caller (default: `3`, minimum `1`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub max_command_attempts: u32,
}

impl ServiceConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_command_attempts: std::env::var("EVENT_COMMAND_MAX_ATTEMPTS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_command_attempts)
                .max(1),
        }
    }

    /// Sets the attempt limit, clamped to at least one.
    pub fn with_max_command_attempts(mut self, attempts: u32) -> Self {
        self.max_command_attempts = attempts.max(1);
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_command_attempts: 3,
        }
    }
}
