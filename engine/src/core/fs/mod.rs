//! Filesystem utilities.
//!
//! Crash-tolerant writes for settings, preset catalogs and export artifacts,
//! plus filename sanitizing for suggested download names.
//!
//! A partial write (power loss, crash) must never leave a half-written preset
//! catalog or a truncated video behind. Windows semantics differ from Unix for
//! rename-over-existing; both are handled.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Filename Utilities
// =============================================================================

/// Turns arbitrary text (a video title, a preset label) into a safe file stem.
///
/// Keeps ASCII alphanumerics, `-` and `_`; every other run of characters
/// collapses into a single `_`. Returns `None` when nothing usable remains.
pub fn sanitize_file_stem(raw: &str) -> Option<String> {
    let mut stem = String::with_capacity(raw.len());
    let mut last_was_separator = false;

    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
            last_was_separator = false;
        } else if !last_was_separator && !stem.is_empty() {
            stem.push('_');
            last_was_separator = true;
        }
    }

    let stem = stem.trim_end_matches('_').to_string();
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes atomically: temp file, fsync, then rename over the destination.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)?;
    Ok(())
}

/// Write a JSON file atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "tmp")
}

fn bak_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Backup swap so a failed rename can restore the previous file.
    let bak = bak_path_for(dest);
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("presets.json");

        atomic_write_bytes(&path, b"[]").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"[]");
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        atomic_write_json_pretty(&path, &serde_json::json!({ "version": 1 })).unwrap();
        atomic_write_json_pretty(&path, &serde_json::json!({ "version": 2 })).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["version"], 2);
        assert!(!bak_path_for(&path).exists());
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(
            sanitize_file_stem("My Holiday Video (final).mp4"),
            Some("My_Holiday_Video_final_mp4".to_string())
        );
        assert_eq!(sanitize_file_stem("clip-01_a"), Some("clip-01_a".to_string()));
        assert_eq!(sanitize_file_stem("  ../../  "), None);
        assert_eq!(sanitize_file_stem(""), None);
    }
}
