// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Web Scan Engine Library
 * Scan orchestration and the probe pipeline
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod crawler;
pub mod database;
pub mod payloads;
pub mod scorer;
pub mod store;
pub mod tls_inspector;
pub mod types;

// Probe modules
pub mod scanners;
pub mod http_client;

// Error handling
pub mod errors;

// Orchestrator and background execution
pub mod engine;
pub mod worker;

// Request-facing operations
pub mod service;
