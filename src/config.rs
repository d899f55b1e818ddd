//! # Configuration Management
//!
//! Centralized configuration for the packet codec.
//!
//! This module provides the protocol's compiled-in constants and a structured
//! configuration type for tuning codec limits per connection or per client.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - Header and payload size limits are enforced *before* allocation, so a
//!   hostile length claim cannot exhaust memory
//! - The packet version is injected into the codec at construction rather
//!   than read from global state, so mixed-version peers are testable

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Current packet wire-format version
pub const PACKET_VERSION: u8 = 6;

/// Size of the fixed frame prefix: header length (4) + key length (4) +
/// value length (4) + packet version (1)
pub const FRAME_PREFIX_LEN: usize = 13;

/// Maximum number of secondary-index descriptors per packet
pub const MAX_INDEXES: usize = 10;

/// Name cache entry bound; the cache is cleared wholesale when an insertion
/// finds it at this size
pub const NAME_CACHE_LIMIT: usize = 10_000;

/// Max allowed header size claim (64 KiB)
pub const MAX_HEADER_SIZE: usize = 64 * 1024;

/// Max allowed key or value payload size claim (16 MiB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Initial capacity of a header scratch buffer; large enough for a full
/// header with every optional present and a typical resource name
pub const DEFAULT_HEADER_CAPACITY: usize = 512;

/// Codec configuration for one client or connection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Wire-format version this codec speaks; decode rejects any other
    pub packet_version: u8,

    /// Upper bound on an incoming header-length claim
    pub max_header_size: usize,

    /// Upper bound on an incoming key or value length claim
    pub max_payload_size: usize,

    /// Name cache size at which the next insertion clears the cache
    pub name_cache_limit: usize,

    /// Initial capacity of the header scratch buffer
    pub header_capacity: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            packet_version: PACKET_VERSION,
            max_header_size: MAX_HEADER_SIZE,
            max_payload_size: MAX_PAYLOAD_SIZE,
            name_cache_limit: NAME_CACHE_LIMIT,
            header_capacity: DEFAULT_HEADER_CAPACITY,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(version) = std::env::var("GRIDWIRE_PACKET_VERSION") {
            if let Ok(val) = version.parse::<u8>() {
                config.packet_version = val;
            }
        }

        if let Ok(limit) = std::env::var("GRIDWIRE_NAME_CACHE_LIMIT") {
            if let Ok(val) = limit.parse::<usize>() {
                config.name_cache_limit = val;
            }
        }

        if let Ok(size) = std::env::var("GRIDWIRE_MAX_HEADER_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.max_header_size = val;
            }
        }

        if let Ok(size) = std::env::var("GRIDWIRE_MAX_PAYLOAD_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.max_payload_size = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // The smallest legal header holds the always-present fields:
        // operation + block id + thread id + bitmask + call id +
        // response type + name length + index count.
        if self.max_header_size < 24 {
            errors.push(format!(
                "max_header_size too small: {} (a minimal header is 24 bytes)",
                self.max_header_size
            ));
        }

        if self.max_payload_size == 0 {
            errors.push("max_payload_size must be greater than 0".to_string());
        }

        if self.name_cache_limit == 0 {
            errors.push("name_cache_limit must be greater than 0".to_string());
        }

        if self.header_capacity < FRAME_PREFIX_LEN {
            errors.push(format!(
                "header_capacity too small: {} (minimum: the {FRAME_PREFIX_LEN}-byte frame prefix)",
                self.header_capacity
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}
