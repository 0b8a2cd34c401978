//! On-disk persistence of the OAuth2 credential.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use drivekit_common::Credential;

const APP_DIR: &str = "drivekit";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Default credential location under the user config directory.
pub fn default_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(base.join(APP_DIR).join(CREDENTIALS_FILE))
}

/// Read a stored credential, if any.
pub fn load(path: &Path) -> Result<Option<Credential>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let credential = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid credential file {}", path.display()))?;
    Ok(Some(credential))
}

/// Write a credential, creating parent directories as needed.
pub fn save(path: &Path, credential: &Credential) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(credential)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);

        // `mode` only applies on creation; tighten a file left by an older write.
        if path.exists() {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Delete a stored credential. Returns whether one existed.
pub fn remove(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CREDENTIALS_FILE);

        assert!(load(&path).unwrap().is_none());

        let credential = Credential {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: None,
        };
        save(&path, &credential).unwrap();

        assert_eq!(load(&path).unwrap(), Some(credential));
        assert!(remove(&path).unwrap());
        assert!(!remove(&path).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CREDENTIALS_FILE);
        let credential = Credential::bearer("a");

        save(&path, &credential).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // A pre-existing world-readable file is tightened before being rewritten.
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        save(&path, &credential).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load(&path).unwrap(), Some(credential));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, "{").unwrap();

        assert!(load(&path).is_err());
    }
}
