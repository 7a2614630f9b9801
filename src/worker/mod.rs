// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Worker Module
 * Background execution of scans
 *
 * © 2026 Bountyy Oy
 */

pub mod executor;

pub use executor::{ScanExecutor, ScanHandle};
