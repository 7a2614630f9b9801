// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Score
 * Collapses per-severity finding counts into a 0-100 score
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */
use crate::types::SeverityCounts;

const CRITICAL_WEIGHT: f64 = 10.0;
const HIGH_WEIGHT: f64 = 5.0;
const MEDIUM_WEIGHT: f64 = 2.0;
const LOW_WEIGHT: f64 = 1.0;
const INFO_WEIGHT: f64 = 0.5;

/// 100 for a clean scan, lower as the average finding gets more severe
pub fn overall_score(counts: &SeverityCounts) -> u8 {
    let total = counts.total();
    if total == 0 {
        return 100;
    }

    let weighted = counts.critical as f64 * CRITICAL_WEIGHT
        + counts.high as f64 * HIGH_WEIGHT
        + counts.medium as f64 * MEDIUM_WEIGHT
        + counts.low as f64 * LOW_WEIGHT
        + counts.info as f64 * INFO_WEIGHT;

    let score = 100.0 - (weighted / total as f64) * 10.0;
    score.round().clamp(0.0, 100.0) as u8
}
