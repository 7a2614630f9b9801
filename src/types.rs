// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scan mode determines catalog sizes, URL caps and depth of checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Quick,
    Comprehensive,
    Custom,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(ScanMode::Quick),
            "comprehensive" => Ok(ScanMode::Comprehensive),
            "custom" => Ok(ScanMode::Custom),
            other => Err(format!("Unknown scan mode: {}", other)),
        }
    }
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Quick => "quick",
            ScanMode::Comprehensive => "comprehensive",
            ScanMode::Custom => "custom",
        }
    }

    /// Custom scans run the quick catalogs
    pub fn is_comprehensive(&self) -> bool {
        matches!(self, ScanMode::Comprehensive)
    }

    /// Upper bound on the discovered-URL set, seed included
    pub fn url_cap(&self) -> usize {
        if self.is_comprehensive() {
            50
        } else {
            20
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    /// pending -> running -> {completed, failed}; a pending scan may also be
    /// cancelled straight to failed.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Pending, ScanStatus::Running)
                | (ScanStatus::Pending, ScanStatus::Failed)
                | (ScanStatus::Running, ScanStatus::Completed)
                | (ScanStatus::Running, ScanStatus::Failed)
        )
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ScanStatus::Pending),
            "running" => Ok(ScanStatus::Running),
            "completed" => Ok(ScanStatus::Completed),
            "failed" => Ok(ScanStatus::Failed),
            other => Err(format!("Unknown scan status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    /// Ordinal rank, critical highest
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Finding category as it appears at the boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VulnType {
    #[serde(rename = "SSL/TLS")]
    Tls,
    #[serde(rename = "Security Headers")]
    SecurityHeaders,
    #[serde(rename = "Server Configuration")]
    ServerConfiguration,
    #[serde(rename = "Cookie Security")]
    CookieSecurity,
    #[serde(rename = "CORS Policy")]
    CorsPolicy,
    #[serde(rename = "SQL Injection")]
    SqlInjection,
    #[serde(rename = "XSS")]
    Xss,
    #[serde(rename = "CSRF")]
    Csrf,
    #[serde(rename = "Information Disclosure")]
    InformationDisclosure,
    #[serde(rename = "Other")]
    Other,
}

impl VulnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VulnType::Tls => "SSL/TLS",
            VulnType::SecurityHeaders => "Security Headers",
            VulnType::ServerConfiguration => "Server Configuration",
            VulnType::CookieSecurity => "Cookie Security",
            VulnType::CorsPolicy => "CORS Policy",
            VulnType::SqlInjection => "SQL Injection",
            VulnType::Xss => "XSS",
            VulnType::Csrf => "CSRF",
            VulnType::InformationDisclosure => "Information Disclosure",
            VulnType::Other => "Other",
        }
    }
}

impl std::fmt::Display for VulnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VulnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            VulnType::Tls,
            VulnType::SecurityHeaders,
            VulnType::ServerConfiguration,
            VulnType::CookieSecurity,
            VulnType::CorsPolicy,
            VulnType::SqlInjection,
            VulnType::Xss,
            VulnType::Csrf,
            VulnType::InformationDisclosure,
            VulnType::Other,
        ];
        all.into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown vulnerability type: {}", s))
    }
}

/// One detected issue, as produced by a probe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(rename = "type")]
    pub vuln_type: VulnType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub recommendation: String,
}

impl Finding {
    pub fn new(
        vuln_type: VulnType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            vuln_type,
            severity,
            title: title.into(),
            description: description.into(),
            affected_url: None,
            affected_parameter: None,
            evidence: None,
            recommendation: recommendation.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.affected_url = Some(url.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.affected_parameter = Some(parameter.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

/// Persisted finding, owned by a scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub id: String,
    pub scan_id: String,
    #[serde(flatten)]
    pub finding: Finding,
    pub created_at: DateTime<Utc>,
}

impl Vulnerability {
    pub fn from_finding(scan_id: &str, finding: Finding) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            scan_id: scan_id.to_string(),
            finding,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    #[serde(rename = "criticalCount")]
    pub critical: u32,
    #[serde(rename = "highCount")]
    pub high: u32,
    #[serde(rename = "mediumCount")]
    pub medium: u32,
    #[serde(rename = "lowCount")]
    pub low: u32,
    #[serde(rename = "infoCount")]
    pub info: u32,
}

impl SeverityCounts {
    pub fn tally<'a, I>(findings: I) -> Self
    where
        I: IntoIterator<Item = &'a Finding>,
    {
        let mut counts = Self::default();
        for finding in findings {
            counts.add(finding.severity);
        }
        counts
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// One assessment run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: String,
    pub name: String,
    pub target_url: String,
    pub scan_type: ScanMode,
    pub status: ScanStatus,
    pub progress: u8,
    pub current_activity: String,
    pub estimated_time_remaining: Option<String>,
    pub owner_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub counts: SeverityCounts,
    pub total_vulnerabilities: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scan {
    /// Fresh pending record for a validated request
    pub fn new(new_scan: NewScan) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_scan.name,
            target_url: new_scan.target_url,
            scan_type: new_scan.scan_type,
            status: ScanStatus::Pending,
            progress: 0,
            current_activity: "Initializing scan...".to_string(),
            estimated_time_remaining: None,
            owner_id: new_scan.owner_id,
            started_at: None,
            completed_at: None,
            counts: SeverityCounts::default(),
            total_vulnerabilities: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, stamping `updated_at`
    pub fn apply(&mut self, patch: &ScanPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(activity) = &patch.current_activity {
            self.current_activity = activity.clone();
        }
        if let Some(eta) = &patch.estimated_time_remaining {
            self.estimated_time_remaining = Some(eta.clone());
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = Some(completed_at);
        }
        if let Some(counts) = patch.counts {
            self.counts = counts;
        }
        if let Some(total) = patch.total_vulnerabilities {
            self.total_vulnerabilities = total;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields supplied when a scan record is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScan {
    pub name: String,
    pub target_url: String,
    #[serde(default)]
    pub scan_type: ScanMode,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Partial update of a scan record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPatch {
    pub status: Option<ScanStatus>,
    pub progress: Option<u8>,
    pub current_activity: Option<String>,
    pub estimated_time_remaining: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub counts: Option<SeverityCounts>,
    pub total_vulnerabilities: Option<u32>,
    /// Apply only while the stored status still equals this
    pub expected_status: Option<ScanStatus>,
}

/// Listing filter for scan records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFilter {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub status: Option<ScanStatus>,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    50
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self {
            owner_id: None,
            status: None,
            limit: default_list_limit(),
        }
    }
}

impl ScanFilter {
    pub fn matches(&self, scan: &Scan) -> bool {
        if let Some(owner) = &self.owner_id {
            if scan.owner_id.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if scan.status != status {
                return false;
            }
        }
        true
    }
}
