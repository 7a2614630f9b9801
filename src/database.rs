// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - PostgreSQL Database Layer
 * Scan and finding persistence with connection pooling and batch inserts
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::time::Instant;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::store::ScanStore;
use crate::types::{
    Finding, NewScan, Scan, ScanFilter, ScanPatch, SeverityCounts, Vulnerability,
};

const FINDING_COLUMNS: usize = 11;

/// PostgreSQL-backed `ScanStore` with connection pooling
pub struct PostgresScanStore {
    pool: Pool,
    batch_size: usize,
}

impl PostgresScanStore {
    /// Create the pool and verify connectivity
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = Config::new();
        pg_config.url = Some(config.url.clone());

        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(config.pool_size));

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create PostgreSQL pool")?;

        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;

        info!(
            "[SUCCESS] PostgreSQL connected: pool_size={}, batch_size={}",
            config.pool_size, config.batch_size
        );

        Ok(Self {
            pool,
            batch_size: config.batch_size.max(1),
        })
    }

    /// Create tables and indexes if missing
    pub async fn init_schema(&self) -> Result<()> {
        let client = self.pool.get().await?;

        client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS scans (
                    id VARCHAR(64) PRIMARY KEY,
                    name TEXT NOT NULL,
                    target_url TEXT NOT NULL,
                    scan_type VARCHAR(32) NOT NULL DEFAULT 'quick',
                    status VARCHAR(32) NOT NULL DEFAULT 'pending',
                    progress SMALLINT NOT NULL DEFAULT 0,
                    current_activity TEXT NOT NULL DEFAULT '',
                    estimated_time_remaining TEXT,
                    owner_id VARCHAR(255),
                    started_at TIMESTAMP WITH TIME ZONE,
                    completed_at TIMESTAMP WITH TIME ZONE,
                    critical_count INT NOT NULL DEFAULT 0,
                    high_count INT NOT NULL DEFAULT 0,
                    medium_count INT NOT NULL DEFAULT 0,
                    low_count INT NOT NULL DEFAULT 0,
                    info_count INT NOT NULL DEFAULT 0,
                    total_vulnerabilities INT NOT NULL DEFAULT 0,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                &[],
            )
            .await
            .context("Failed to create scans table")?;

        client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS vulnerabilities (
                    id VARCHAR(64) PRIMARY KEY,
                    scan_id VARCHAR(64) NOT NULL,
                    vuln_type VARCHAR(64) NOT NULL,
                    severity VARCHAR(16) NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    affected_url TEXT,
                    affected_parameter TEXT,
                    evidence TEXT,
                    recommendation TEXT NOT NULL,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    FOREIGN KEY (scan_id) REFERENCES scans(id) ON DELETE CASCADE
                )
                "#,
                &[],
            )
            .await
            .context("Failed to create vulnerabilities table")?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_scans_owner_id ON scans(owner_id)",
                &[],
            )
            .await?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_scans_created_at ON scans(created_at)",
                &[],
            )
            .await?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_vulns_scan_id ON vulnerabilities(scan_id)",
                &[],
            )
            .await?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_vulns_severity ON vulnerabilities(severity)",
                &[],
            )
            .await?;

        info!("[SUCCESS] Database schema initialized");

        Ok(())
    }
}

#[async_trait]
impl ScanStore for PostgresScanStore {
    async fn create_scan(&self, new_scan: NewScan) -> Result<Scan> {
        let scan = Scan::new(new_scan);
        let client = self.pool.get().await?;

        client
            .execute(
                r#"
                INSERT INTO scans (id, name, target_url, scan_type, status, progress,
                                   current_activity, owner_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
                &[
                    &scan.id,
                    &scan.name,
                    &scan.target_url,
                    &scan.scan_type.as_str(),
                    &scan.status.as_str(),
                    &(scan.progress as i16),
                    &scan.current_activity,
                    &scan.owner_id,
                    &scan.created_at,
                    &scan.updated_at,
                ],
            )
            .await
            .context("Failed to insert scan")?;

        Ok(scan)
    }

    async fn update_scan(&self, scan_id: &str, patch: ScanPatch) -> Result<Option<Scan>> {
        let client = self.pool.get().await?;

        let status = patch.status.map(|s| s.as_str());
        let progress = patch.progress.map(|p| p as i16);
        let counts = patch.counts.map(count_columns);
        let total = patch.total_vulnerabilities.map(|t| t as i32);
        let expected = patch.expected_status.map(|s| s.as_str());

        let row = client
            .query_opt(
                r#"
                UPDATE scans SET
                    status = COALESCE($2, status),
                    progress = COALESCE($3, progress),
                    current_activity = COALESCE($4, current_activity),
                    estimated_time_remaining = COALESCE($5, estimated_time_remaining),
                    started_at = COALESCE($6, started_at),
                    completed_at = COALESCE($7, completed_at),
                    critical_count = COALESCE($8, critical_count),
                    high_count = COALESCE($9, high_count),
                    medium_count = COALESCE($10, medium_count),
                    low_count = COALESCE($11, low_count),
                    info_count = COALESCE($12, info_count),
                    total_vulnerabilities = COALESCE($13, total_vulnerabilities),
                    updated_at = NOW()
                WHERE id = $1 AND ($14::TEXT IS NULL OR status = $14)
                RETURNING *
                "#,
                &[
                    &scan_id,
                    &status,
                    &progress,
                    &patch.current_activity,
                    &patch.estimated_time_remaining,
                    &patch.started_at,
                    &patch.completed_at,
                    &counts.map(|c| c[0]),
                    &counts.map(|c| c[1]),
                    &counts.map(|c| c[2]),
                    &counts.map(|c| c[3]),
                    &counts.map(|c| c[4]),
                    &total,
                    &expected,
                ],
            )
            .await
            .context("Failed to update scan")?;

        row.as_ref().map(scan_from_row).transpose()
    }

    async fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt("SELECT * FROM scans WHERE id = $1", &[&scan_id])
            .await
            .context("Failed to load scan")?;

        row.as_ref().map(scan_from_row).transpose()
    }

    async fn list_scans(&self, filter: &ScanFilter) -> Result<Vec<Scan>> {
        let client = self.pool.get().await?;

        let status = filter.status.map(|s| s.as_str());
        let rows = client
            .query(
                r#"
                SELECT * FROM scans
                WHERE ($1::TEXT IS NULL OR owner_id = $1)
                  AND ($2::TEXT IS NULL OR status = $2)
                ORDER BY created_at DESC
                LIMIT $3
                "#,
                &[&filter.owner_id, &status, &(filter.limit as i64)],
            )
            .await
            .context("Failed to list scans")?;

        rows.iter().map(scan_from_row).collect()
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<bool> {
        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM scans WHERE id = $1", &[&scan_id])
            .await
            .context("Failed to delete scan")?;

        Ok(deleted > 0)
    }

    async fn insert_findings(&self, scan_id: &str, findings: &[Finding]) -> Result<usize> {
        if findings.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let rows: Vec<Vulnerability> = findings
            .iter()
            .cloned()
            .map(|finding| Vulnerability::from_finding(scan_id, finding))
            .collect();

        let mut client = self.pool.get().await?;
        let transaction = client.transaction().await?;
        let mut inserted = 0u64;

        let chunks: Vec<_> = rows.chunks(self.batch_size).collect();
        for (chunk_idx, chunk) in chunks.iter().enumerate() {
            debug!(
                "Inserting finding batch {}/{} ({} records)",
                chunk_idx + 1,
                chunks.len(),
                chunk.len()
            );

            let mut query = String::with_capacity(256 + chunk.len() * 96);
            query.push_str(
                r#"INSERT INTO vulnerabilities (
                    id, scan_id, vuln_type, severity, title, description,
                    affected_url, affected_parameter, evidence, recommendation, created_at
                ) VALUES "#,
            );

            for i in 0..chunk.len() {
                if i > 0 {
                    query.push_str(", ");
                }
                let placeholders: Vec<String> = (1..=FINDING_COLUMNS)
                    .map(|col| format!("${}", i * FINDING_COLUMNS + col))
                    .collect();
                query.push('(');
                query.push_str(&placeholders.join(", "));
                query.push(')');
            }

            let labels: Vec<(&'static str, &'static str)> = chunk
                .iter()
                .map(|v| (v.finding.vuln_type.as_str(), v.finding.severity.as_str()))
                .collect();

            let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(chunk.len() * FINDING_COLUMNS);
            for (vuln, (vuln_type, severity)) in chunk.iter().zip(labels.iter()) {
                params.push(&vuln.id);
                params.push(&vuln.scan_id);
                params.push(vuln_type);
                params.push(severity);
                params.push(&vuln.finding.title);
                params.push(&vuln.finding.description);
                params.push(&vuln.finding.affected_url);
                params.push(&vuln.finding.affected_parameter);
                params.push(&vuln.finding.evidence);
                params.push(&vuln.finding.recommendation);
                params.push(&vuln.created_at);
            }

            inserted += transaction
                .execute(query.as_str(), &params)
                .await
                .context("Failed to bulk insert findings")?;
        }

        transaction.commit().await?;

        info!(
            "[SUCCESS] Stored {} findings for scan {} in {:.2}ms",
            inserted,
            scan_id,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(inserted as usize)
    }

    async fn find_findings(&self, scan_id: &str) -> Result<Vec<Vulnerability>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT * FROM vulnerabilities WHERE scan_id = $1 ORDER BY created_at",
                &[&scan_id],
            )
            .await
            .context("Failed to load findings")?;

        rows.iter().map(vulnerability_from_row).collect()
    }

    async fn delete_findings(&self, scan_id: &str) -> Result<usize> {
        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM vulnerabilities WHERE scan_id = $1", &[&scan_id])
            .await
            .context("Failed to delete findings")?;

        Ok(deleted as usize)
    }
}

fn count_columns(counts: SeverityCounts) -> [i32; 5] {
    [
        counts.critical as i32,
        counts.high as i32,
        counts.medium as i32,
        counts.low as i32,
        counts.info as i32,
    ]
}

fn scan_from_row(row: &Row) -> Result<Scan> {
    let scan_type: String = row.try_get("scan_type")?;
    let status: String = row.try_get("status")?;
    let progress: i16 = row.try_get("progress")?;
    let count = |column: &str| -> Result<u32> {
        let value: i32 = row.try_get(column)?;
        Ok(value.max(0) as u32)
    };

    Ok(Scan {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        target_url: row.try_get("target_url")?,
        scan_type: scan_type.parse().map_err(|e: String| anyhow!(e))?,
        status: status.parse().map_err(|e: String| anyhow!(e))?,
        progress: progress.clamp(0, 100) as u8,
        current_activity: row.try_get("current_activity")?,
        estimated_time_remaining: row.try_get("estimated_time_remaining")?,
        owner_id: row.try_get("owner_id")?,
        started_at: row.try_get::<_, Option<DateTime<Utc>>>("started_at")?,
        completed_at: row.try_get::<_, Option<DateTime<Utc>>>("completed_at")?,
        counts: SeverityCounts {
            critical: count("critical_count")?,
            high: count("high_count")?,
            medium: count("medium_count")?,
            low: count("low_count")?,
            info: count("info_count")?,
        },
        total_vulnerabilities: count("total_vulnerabilities")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn vulnerability_from_row(row: &Row) -> Result<Vulnerability> {
    let vuln_type: String = row.try_get("vuln_type")?;
    let severity: String = row.try_get("severity")?;

    Ok(Vulnerability {
        id: row.try_get("id")?,
        scan_id: row.try_get("scan_id")?,
        finding: Finding {
            vuln_type: vuln_type.parse().map_err(|e: String| anyhow!(e))?,
            severity: severity.parse().map_err(|e: String| anyhow!(e))?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            affected_url: row.try_get("affected_url")?,
            affected_parameter: row.try_get("affected_parameter")?,
            evidence: row.try_get("evidence")?,
            recommendation: row.try_get("recommendation")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_columns_order() {
        let counts = SeverityCounts {
            critical: 1,
            high: 2,
            medium: 3,
            low: 4,
            info: 5,
        };
        assert_eq!(count_columns(counts), [1, 2, 3, 4, 5]);
    }
}
