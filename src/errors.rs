// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Typed errors for the scan service, persistence and network layers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Request validation errors, surfaced to the caller before any work starts
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scan not found: {scan_id}")]
    ScanNotFound {
        scan_id: String,
    },

    #[error("Scan {scan_id} is already running")]
    AlreadyRunning {
        scan_id: String,
    },

    #[error("Invalid status transition for scan {scan_id}: {from} -> {to}")]
    InvalidTransition {
        scan_id: String,
        from: String,
        to: String,
    },

    /// Persistence port failures
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Network-specific errors with detailed classification
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout {
        url: String,
        timeout: Duration,
    },

    #[error("Connection refused for {url}")]
    ConnectionRefused {
        url: String,
    },

    #[error("Network error: {0}")]
    Other(String),
}

/// Convert reqwest errors to our error types
impl From<reqwest::Error> for ScannerError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            ScannerError::Network(NetworkError::ConnectionTimeout {
                url,
                timeout: Duration::from_secs(10),
            })
        } else if err.is_connect() {
            ScannerError::Network(NetworkError::ConnectionRefused { url })
        } else {
            ScannerError::Network(NetworkError::Other(err.to_string()))
        }
    }
}

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;
