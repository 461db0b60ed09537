//! # Cache Core Configuration Management
//!
//! This module provides configuration management for the cache core based on
//! the process environment. It allows different invalidation cadences in
//! production, development, and test environments, with explicit environment
//! variable overrides for operators.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_NAMESPACE, DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_QUEUE_MAX_SIZE,
    DEFAULT_SUBMIT_CHANNEL_CAPACITY,
};
use crate::error::{CacheCoreError, Result};

/// Configuration for the cache core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheCoreConfig {
    /// Namespace prepended to every key built by this process
    pub namespace: String,
    /// Bound on the in-memory invalidation queue (drop-oldest on overflow)
    pub queue_max_size: usize,
    /// Maximum events drained per worker tick
    pub worker_batch_size: usize,
    /// Seconds the worker sleeps between ticks
    pub poll_interval_seconds: u64,
    /// Capacity of the fire-and-forget submission channel
    pub submit_channel_capacity: usize,
}

impl Default for CacheCoreConfig {
    /// Default configuration suitable for production
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            queue_max_size: DEFAULT_QUEUE_MAX_SIZE,
            worker_batch_size: DEFAULT_BATCH_SIZE,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            submit_channel_capacity: DEFAULT_SUBMIT_CHANNEL_CAPACITY,
        }
    }
}

impl CacheCoreConfig {
    /// Create test-optimized configuration with rapid invalidation
    pub fn for_test() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            queue_max_size: 100,
            worker_batch_size: 10,
            poll_interval_seconds: 1,
            submit_channel_capacity: 16,
        }
    }

    /// Create development-optimized configuration
    pub fn for_development() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            queue_max_size: 500,
            worker_batch_size: 25,
            poll_interval_seconds: 2,
            submit_channel_capacity: 64,
        }
    }

    /// Load configuration from environment or use defaults
    pub fn from_environment() -> Self {
        let environment = env::var("FILEWORKS_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .or_else(|_| env::var("RUST_ENV"))
            .unwrap_or_else(|_| "production".to_string());

        let config = match environment.as_str() {
            "test" => {
                info!("Loading test cache core configuration (rapid invalidation)");
                Self::for_test()
            }
            "development" => {
                info!("Loading development cache core configuration");
                Self::for_development()
            }
            _ => {
                info!("Loading production cache core configuration");
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Apply environment variable overrides to configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(namespace) = env::var("FILEWORKS_CACHE_NAMESPACE") {
            if !namespace.is_empty() {
                info!("Cache namespace override: {}", namespace);
                self.namespace = namespace;
            }
        }

        if let Ok(max) = env::var("FILEWORKS_CACHE_QUEUE_MAX_SIZE") {
            if let Ok(size) = max.parse::<usize>() {
                info!("Invalidation queue max size override: {}", size);
                self.queue_max_size = size;
            }
        }

        if let Ok(batch) = env::var("FILEWORKS_CACHE_WORKER_BATCH_SIZE") {
            if let Ok(size) = batch.parse::<usize>() {
                info!("Worker batch size override: {}", size);
                self.worker_batch_size = size;
            }
        }

        if let Ok(interval) = env::var("FILEWORKS_CACHE_POLL_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                info!("Worker poll interval override: {}s", seconds);
                self.poll_interval_seconds = seconds;
            }
        }

        self
    }

    /// Get the worker poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(CacheCoreError::configuration(
                "namespace",
                "namespace must not be empty",
            ));
        }

        if self.namespace.contains(':') {
            return Err(CacheCoreError::configuration(
                "namespace",
                "namespace must not contain the key separator ':'",
            ));
        }

        if self.queue_max_size == 0 {
            return Err(CacheCoreError::configuration(
                "queue_max_size",
                "invalidation queue bound must be greater than 0",
            ));
        }

        if self.worker_batch_size == 0 {
            return Err(CacheCoreError::configuration(
                "worker_batch_size",
                "worker batch size must be greater than 0",
            ));
        }

        if self.poll_interval_seconds == 0 {
            return Err(CacheCoreError::configuration(
                "poll_interval_seconds",
                "poll interval must be greater than 0",
            ));
        }

        if self.submit_channel_capacity == 0 {
            return Err(CacheCoreError::configuration(
                "submit_channel_capacity",
                "submission channel capacity must be greater than 0",
            ));
        }

        if self.worker_batch_size > self.queue_max_size {
            warn!(
                "Worker batch size {} exceeds queue bound {} - batches will never fill",
                self.worker_batch_size, self.queue_max_size
            );
        }

        Ok(())
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!("Cache Core Configuration:");
        info!("  Namespace: {}", self.namespace);
        info!("  Queue Max Size: {}", self.queue_max_size);
        info!("  Worker Batch Size: {}", self.worker_batch_size);
        info!("  Poll Interval: {}s", self.poll_interval_seconds);
        info!(
            "  Submit Channel Capacity: {}",
            self.submit_channel_capacity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = CacheCoreConfig::default();
        assert_eq!(config.namespace, "fw");
        assert_eq!(config.queue_max_size, 1000);
        assert_eq!(config.worker_batch_size, 50);
        assert_eq!(config.poll_interval_seconds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_configuration() {
        let config = CacheCoreConfig::for_test();
        assert_eq!(config.poll_interval_seconds, 1);
        assert_eq!(config.queue_max_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_namespace() {
        let config = CacheCoreConfig {
            namespace: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheCoreError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_namespace_with_separator() {
        let config = CacheCoreConfig {
            namespace: "fw:prod".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_bounds() {
        let config = CacheCoreConfig {
            queue_max_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CacheCoreConfig {
            worker_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CacheCoreConfig {
            poll_interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("FILEWORKS_CACHE_QUEUE_MAX_SIZE", "250");
        env::set_var("FILEWORKS_CACHE_WORKER_BATCH_SIZE", "5");

        let config = CacheCoreConfig::default().with_env_overrides();
        assert_eq!(config.queue_max_size, 250);
        assert_eq!(config.worker_batch_size, 5);

        env::remove_var("FILEWORKS_CACHE_QUEUE_MAX_SIZE");
        env::remove_var("FILEWORKS_CACHE_WORKER_BATCH_SIZE");
    }

    #[test]
    fn test_poll_interval_duration() {
        let config = CacheCoreConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }
}
