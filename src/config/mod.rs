// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;

pub use self::core::{AppConfig, DatabaseConfig, ObservabilityConfig, ScannerConfig};

use anyhow::{Context, Result};
use std::str::FromStr;
use validator::Validate;

impl AppConfig {
    /// Defaults overridden by environment variables, then validated
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(db_url) = lookup("DATABASE_URL") {
            config.database.url = db_url;
            config.database.enabled = true;
        }

        if let Some(pool_size) = lookup("DATABASE_POOL_SIZE") {
            config.database.pool_size = parse_var("DATABASE_POOL_SIZE", &pool_size)?;
        }

        if let Some(scans) = lookup("MAX_CONCURRENT_SCANS") {
            config.scanner.max_concurrent_scans = parse_var("MAX_CONCURRENT_SCANS", &scans)?;
        }

        if let Some(in_flight) = lookup("MAX_REQUESTS_IN_FLIGHT") {
            config.scanner.max_requests_in_flight =
                parse_var("MAX_REQUESTS_IN_FLIGHT", &in_flight)?;
        }

        if let Some(per_scan) = lookup("MAX_REQUESTS_PER_SCAN") {
            config.scanner.max_requests_per_scan = parse_var("MAX_REQUESTS_PER_SCAN", &per_scan)?;
        }

        if let Some(accept) = lookup("ACCEPT_INVALID_CERTS") {
            config.scanner.accept_invalid_certs = parse_var("ACCEPT_INVALID_CERTS", &accept)?;
        }

        if let Some(persist) = lookup("PERSIST_PARTIAL_FINDINGS") {
            config.scanner.persist_partial_findings =
                parse_var("PERSIST_PARTIAL_FINDINGS", &persist)?;
        }

        if let Some(user_agent) = lookup("SCANNER_USER_AGENT") {
            config.scanner.user_agent = Some(user_agent);
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.observability.log_level = log_level;
        }

        if let Some(json) = lookup("LOG_JSON") {
            config.observability.json_logs = parse_var("LOG_JSON", &json)?;
        }

        config
            .validate()
            .context("Invalid configuration")?;

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {} value", name))
}
