//! `wikisync sync` — walk a directory and upload each Markdown file.
//!
//! Files are processed one at a time; a failure for one file is logged,
//! counted, and never stops the rest of the run.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wikisync_config::settings::{ENV_PARENT_NODE, ENV_SPACE_ID};
use wikisync_config::Settings;

use crate::exit_codes;
use crate::wiki::resolve_client;
use crate::CliError;

pub fn cmd_sync(
    dir: Option<PathBuf>,
    space: Option<String>,
    parent: Option<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = Settings::load();

    // 1. Resolve inputs: flag > env/settings > error
    let root = dir.unwrap_or_else(|| PathBuf::from(&settings.docs_dir));
    if !root.is_dir() {
        return Err(CliError::usage(format!("not a directory: {}", root.display())));
    }

    let space = resolve_target(space, &settings.space_id, "--space", ENV_SPACE_ID)?;
    let parent = resolve_target(parent, &settings.parent_node_token, "--parent", ENV_PARENT_NODE)?;

    let mut client = resolve_client(&settings)?;

    // 2. Scan
    let files = scan_markdown(&root);
    if files.is_empty() {
        if !quiet {
            eprintln!("no Markdown files found under {}", root.display());
        }
        return Ok(());
    }

    let show_progress = !quiet && atty::is(atty::Stream::Stderr);
    if show_progress {
        eprintln!("Syncing {} files from {}...", files.len(), root.display());
    }

    // 3. Upload sequentially, tallying outcomes. Per-file failures never
    // propagate past this loop.
    let mut synced = 0usize;
    let mut failed = 0usize;

    for path in &files {
        let name = display_name(path, &root);
        match client.upload_file(&space, &parent, path) {
            Ok(node_token) => {
                synced += 1;
                if show_progress {
                    eprintln!("  {} -> {}", name, node_token);
                }
            }
            Err(e) => {
                failed += 1;
                log::error!("{}: {}", path.display(), e);
                if show_progress {
                    eprintln!("  {} failed: {}", name, e);
                }
            }
        }
    }

    if !quiet {
        eprintln!("Done: {} synced, {} failed ({} files)", synced, failed, files.len());
    }

    if failed > 0 {
        return Err(CliError {
            code: exit_codes::EXIT_SYNC_PARTIAL,
            message: format!("{} of {} files failed to sync", failed, files.len()),
            hint: None,
        });
    }

    Ok(())
}

/// Enumerate Markdown files under `root`, sorted for deterministic order.
pub(crate) fn scan_markdown(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("md"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Resolve a required value: flag > settings (env overrides already
/// applied) > usage error naming both knobs.
pub(crate) fn resolve_target(
    flag: Option<String>,
    configured: &str,
    flag_name: &str,
    env_var: &str,
) -> Result<String, CliError> {
    if let Some(v) = flag {
        let trimmed = v.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }

    let configured = configured.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }

    Err(CliError::usage(format!("missing {} (no configured value)", flag_name))
        .with_hint(format!("pass {} or set {}", flag_name, env_var)))
}

fn display_name(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_markdown_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("UPPER.MD"), "u").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "t").unwrap();
        std::fs::write(dir.path().join("no_extension"), "n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.md"), "c").unwrap();

        let files = scan_markdown(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| display_name(p, dir.path()))
            .collect();

        assert_eq!(names, vec!["UPPER.MD", "a.md", "b.md", "sub/c.md"]);
    }

    #[test]
    fn test_scan_markdown_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_markdown(dir.path()).is_empty());
    }

    #[test]
    fn test_scan_markdown_directories_excluded() {
        // A directory named like a Markdown file must not be picked up
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fake.md")).unwrap();
        assert!(scan_markdown(dir.path()).is_empty());
    }

    #[test]
    fn test_resolve_target_flag_beats_settings() {
        let v = resolve_target(Some(" 7034 ".into()), "9999", "--space", "WIKISYNC_SPACE_ID");
        assert_eq!(v.unwrap(), "7034");
    }

    #[test]
    fn test_resolve_target_falls_back_to_settings() {
        let v = resolve_target(None, "9999", "--space", "WIKISYNC_SPACE_ID");
        assert_eq!(v.unwrap(), "9999");
    }

    #[test]
    fn test_resolve_target_missing() {
        let err = resolve_target(None, "  ", "--space", "WIKISYNC_SPACE_ID").unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.message.contains("--space"));
        assert!(err.hint.unwrap().contains("WIKISYNC_SPACE_ID"));
    }
}
