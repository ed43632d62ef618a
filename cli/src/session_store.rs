//! Session tokens persisted between CLI invocations.
//!
//! A small JSON file, readable only by its owner on Unix. `logout` deletes
//! it.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use ledgerline_client::session::SessionCredentials;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
    saved_at: DateTime<Utc>,
}

/// `~/.ledgerline/session.json`, or `./.ledgerline-session.json` when there
/// is no home directory.
pub fn default_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".ledgerline").join("session.json"),
        None => PathBuf::from(".ledgerline-session.json"),
    }
}

/// Writes `credentials` to `path`, creating parent directories.
pub fn save(path: &Path, credentials: &SessionCredentials) -> Result<()> {
    let access = credentials
        .access_token()
        .ok_or_else(|| anyhow!("refusing to store a session without an access token"))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let stored = StoredSession {
        access: access.to_string(),
        refresh: credentials.refresh_token().map(str::to_string),
        saved_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&stored)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write session to {}", path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::debug!(path = %path.display(), "session saved");
    Ok(())
}

/// Reads the stored session.
pub fn load(path: &Path) -> Result<SessionCredentials> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(anyhow!("not signed in; run `ledgerline login` first"));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let stored: StoredSession = serde_json::from_str(&raw)
        .with_context(|| format!("corrupt session file {}", path.display()))?;
    tracing::debug!(saved_at = %stored.saved_at, "session loaded");

    Ok(SessionCredentials::new(
        stored.access,
        stored.refresh.unwrap_or_default(),
    ))
}

/// Deletes the stored session. Returns whether there was one.
pub fn remove(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}
