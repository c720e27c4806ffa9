//! Application credential storage.
//!
//! Reads/writes ~/.config/wikisync/auth.json (0600 on Unix).
//! `wikisync login` saves credentials here; `sync` and `nodes` pick them up.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Application identity stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppCredentials {
    /// Application identifier issued by the wiki platform
    pub app_id: String,
    /// Application secret issued by the wiki platform
    pub app_secret: String,
    /// API base URL (e.g., "https://open.feishu.cn/open-apis")
    pub api_base: String,
}

impl AppCredentials {
    pub fn new(app_id: String, app_secret: String, api_base: String) -> Self {
        Self { app_id, app_secret, api_base }
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("wikisync/auth.json"))
}

/// Load saved credentials from disk.
/// Returns None if no credentials are saved or if the file is invalid.
pub fn load_auth() -> Option<AppCredentials> {
    load_auth_from(&auth_file_path()?)
}

/// Load credentials from a specific file.
pub fn load_auth_from(path: &Path) -> Option<AppCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save credentials to disk.
/// Creates the parent directory if it doesn't exist.
/// Sets 0600 permissions on Unix.
pub fn save_auth(creds: &AppCredentials) -> Result<(), String> {
    let path = auth_file_path().ok_or("Could not determine config directory")?;
    save_auth_to(&path, creds)
}

/// Save credentials to a specific file.
pub fn save_auth_to(path: &Path, creds: &AppCredentials) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

    std::fs::write(path, &contents)
        .map_err(|e| format!("Failed to write auth file: {}", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| format!("Failed to set file permissions: {}", e))?;
    }

    Ok(())
}

/// Delete saved credentials.
pub fn delete_auth() -> Result<(), String> {
    let Some(path) = auth_file_path() else {
        return Ok(());
    };
    delete_auth_at(&path)
}

/// Delete a specific credentials file. Missing file is not an error.
pub fn delete_auth_at(path: &Path) -> Result<(), String> {
    if path.exists() {
        std::fs::remove_file(path)
            .map_err(|e| format!("Failed to delete auth file: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_roundtrip() {
        let creds = AppCredentials {
            app_id: "cli_a1b2c3".into(),
            app_secret: "s3cr3t".into(),
            api_base: "https://open.feishu.cn/open-apis".into(),
        };

        let json = serde_json::to_string_pretty(&creds).unwrap();
        let parsed: AppCredentials = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.app_id, "cli_a1b2c3");
        assert_eq!(parsed.app_secret, "s3cr3t");
        assert_eq!(parsed.api_base, "https://open.feishu.cn/open-apis");
    }

    #[test]
    fn test_auth_file_path_exists() {
        let path = auth_file_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("wikisync"));
        assert!(path.to_string_lossy().contains("auth.json"));
    }

    #[test]
    fn test_save_load_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist yet; save must create it
        let path = dir.path().join("wikisync").join("auth.json");

        let creds = AppCredentials::new("id1".into(), "sec1".into(), "https://api.test".into());
        save_auth_to(&path, &creds).unwrap();

        let loaded = load_auth_from(&path).unwrap();
        assert_eq!(loaded.app_id, "id1");
        assert_eq!(loaded.app_secret, "sec1");
        assert_eq!(loaded.api_base, "https://api.test");

        delete_auth_at(&path).unwrap();
        assert!(load_auth_from(&path).is_none());
        // Deleting again is a no-op
        delete_auth_at(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_save_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        let creds = AppCredentials::new("id1".into(), "sec1".into(), "https://api.test".into());
        save_auth_to(&path, &creds).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_invalid_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(load_auth_from(&path).is_none());
    }
}
