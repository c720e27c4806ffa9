// Sync settings
// Loaded from ~/.config/wikisync/settings.json, then overridden by
// WIKISYNC_* environment variables. Precedence: CLI flag > env > file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variables recognized as overrides.
pub const ENV_SPACE_ID: &str = "WIKISYNC_SPACE_ID";
pub const ENV_PARENT_NODE: &str = "WIKISYNC_PARENT_NODE";
pub const ENV_DOCS_DIR: &str = "WIKISYNC_DOCS_DIR";
pub const ENV_API_BASE: &str = "WIKISYNC_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "WIKISYNC_TIMEOUT_SECS";
pub const ENV_INSECURE_TLS: &str = "WIKISYNC_INSECURE_TLS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API base URL for the wiki service
    #[serde(rename = "api.base")]
    pub api_base: String,

    /// Target knowledge-base (space) identifier
    #[serde(rename = "wiki.spaceId")]
    pub space_id: String,

    /// Parent node token new documents are created under
    #[serde(rename = "wiki.parentNodeToken")]
    pub parent_node_token: String,

    /// Local directory scanned for Markdown files
    #[serde(rename = "sync.docsDir")]
    pub docs_dir: String,

    /// Disable TLS certificate verification (explicit opt-in only)
    #[serde(rename = "http.insecureTls")]
    pub insecure_tls: bool,

    /// Request timeout in seconds, applied uniformly to every call
    #[serde(rename = "http.timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "https://open.feishu.cn/open-apis".into(),
            space_id: String::new(),
            parent_node_token: String::new(),
            docs_dir: "docs".into(),
            insecure_tls: false,
            timeout_secs: 30,
        }
    }
}

/// Get the settings file path
pub fn settings_file_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wikisync");
    config_dir.join("settings.json")
}

impl Settings {
    /// Load settings from disk, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut settings = Self::load_file(&settings_file_path());
        settings.apply_env_overrides();
        settings
    }

    /// Load settings from a specific file, falling back to defaults.
    pub fn load_file(path: &PathBuf) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        eprintln!("Error parsing settings.json: {}", e);
                        eprintln!("Using default settings");
                        Self::default()
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Environment variables beat the settings file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_override(ENV_SPACE_ID) {
            self.space_id = v;
        }
        if let Some(v) = env_override(ENV_PARENT_NODE) {
            self.parent_node_token = v;
        }
        if let Some(v) = env_override(ENV_DOCS_DIR) {
            self.docs_dir = v;
        }
        if let Some(v) = env_override(ENV_API_BASE) {
            self.api_base = v;
        }
        if let Some(v) = env_override(ENV_TIMEOUT_SECS) {
            match v.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => eprintln!("Ignoring invalid {}: {}", ENV_TIMEOUT_SECS, v),
            }
        }
        if let Some(v) = env_override(ENV_INSECURE_TLS) {
            match v.as_str() {
                "1" | "true" => self.insecure_tls = true,
                "0" | "false" => self.insecure_tls = false,
                _ => eprintln!("Ignoring invalid {}: {}", ENV_INSECURE_TLS, v),
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = settings_file_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(&path, json).map_err(|e| e.to_string())
    }
}

fn env_override(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.api_base, "https://open.feishu.cn/open-apis");
        assert!(s.space_id.is_empty());
        assert_eq!(s.docs_dir, "docs");
        assert!(!s.insecure_tls);
        assert_eq!(s.timeout_secs, 30);
    }

    #[test]
    fn test_load_file_missing_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings::load_file(&path);
        assert_eq!(s.docs_dir, "docs");
    }

    #[test]
    fn test_load_file_partial_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "wiki.spaceId": "7034" }"#).unwrap();

        let s = Settings::load_file(&path);
        assert_eq!(s.space_id, "7034");
        // untouched fields keep their defaults
        assert_eq!(s.timeout_secs, 30);
        assert!(!s.insecure_tls);
    }

    #[test]
    fn test_load_file_strips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            "{\n// target space\n\"wiki.spaceId\": \"7034\",\n\"sync.docsDir\": \"notes\"\n}",
        )
        .unwrap();

        let s = Settings::load_file(&path);
        assert_eq!(s.space_id, "7034");
        assert_eq!(s.docs_dir, "notes");
    }

    #[test]
    fn test_load_file_garbage_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let s = Settings::load_file(&path);
        assert_eq!(s.docs_dir, "docs");
    }

    #[test]
    fn test_env_override_beats_file() {
        std::env::set_var("WIKISYNC_SPACE_ID", "env-space");
        let mut s = Settings {
            space_id: "file-space".into(),
            ..Settings::default()
        };
        s.apply_env_overrides();
        assert_eq!(s.space_id, "env-space");
        std::env::remove_var("WIKISYNC_SPACE_ID");
    }

    #[test]
    fn test_env_override_blank_ignored() {
        std::env::set_var("WIKISYNC_DOCS_DIR", "   ");
        let mut s = Settings::default();
        s.apply_env_overrides();
        assert_eq!(s.docs_dir, "docs");
        std::env::remove_var("WIKISYNC_DOCS_DIR");
    }

    #[test]
    fn test_env_override_timeout_and_tls() {
        std::env::set_var(ENV_TIMEOUT_SECS, "5");
        std::env::set_var(ENV_INSECURE_TLS, "true");
        let mut s = Settings::default();
        s.apply_env_overrides();
        assert_eq!(s.timeout_secs, 5);
        assert!(s.insecure_tls);

        // Unparseable values are ignored, keeping the previous setting
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        std::env::set_var(ENV_INSECURE_TLS, "maybe");
        s.apply_env_overrides();
        assert_eq!(s.timeout_secs, 5);
        assert!(s.insecure_tls);

        std::env::remove_var(ENV_TIMEOUT_SECS);
        std::env::remove_var(ENV_INSECURE_TLS);
    }

    #[test]
    fn test_roundtrip_json() {
        let s = Settings {
            space_id: "7034".into(),
            parent_node_token: "wikcnRoot".into(),
            docs_dir: "notes".into(),
            insecure_tls: true,
            timeout_secs: 10,
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&s).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.space_id, "7034");
        assert_eq!(parsed.parent_node_token, "wikcnRoot");
        assert!(parsed.insecure_tls);
        assert_eq!(parsed.timeout_secs, 10);
    }
}
