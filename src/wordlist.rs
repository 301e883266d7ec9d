use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parse wordlist content into an ordered, deduplicated list of candidate paths.
///
/// Supported formats per line:
/// - one path per line: `admin`, `.git/HEAD`, `backup.zip`
/// - a leading `/` is dropped, so `/admin` and `admin` are the same candidate
/// - lines starting with `#` are comments
/// - whitespace and blank lines are ignored
pub fn parse_wordlist_str(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for raw_line in s.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let path = line.trim_start_matches('/');
        if path.is_empty() {
            continue;
        }
        if seen.insert(path.to_string()) {
            out.push(path.to_string());
        }
    }

    out
}

/// Load a wordlist from a file path. Errors if the file cannot be read.
pub fn load_wordlist_from_path(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read wordlist file: {}", path.as_ref().display()))?;
    Ok(parse_wordlist_str(&content))
}

/// A compact built-in list of commonly exposed paths: admin panels,
/// configuration files, backups and development leftovers.
pub fn default_wordlist() -> Vec<String> {
    const DEFAULT: &[&str] = &[
        "admin",
        "administrator",
        "admin.php",
        "login",
        "wp-admin",
        "wp-login.php",
        "phpmyadmin",
        "dashboard",
        "cpanel",
        ".env",
        ".env.local",
        ".git/HEAD",
        ".git/config",
        ".svn/entries",
        ".htaccess",
        ".htpasswd",
        ".DS_Store",
        "web.config",
        "config.php",
        "config.json",
        "wp-config.php.bak",
        "backup",
        "backup.zip",
        "backup.tar.gz",
        "db.sql",
        "dump.sql",
        "database.sql",
        "phpinfo.php",
        "info.php",
        "server-status",
        "debug",
        "test",
        "dev",
        "staging",
        "api",
        "swagger.json",
        "actuator/health",
        "robots.txt",
        "sitemap.xml",
        "crossdomain.xml",
    ];
    DEFAULT.iter().map(|s| s.to_string()).collect()
}
