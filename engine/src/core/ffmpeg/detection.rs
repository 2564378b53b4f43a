//! FFmpeg Detection Module
//!
//! Locates a system FFmpeg installation for burned-in exports.
//! `CAPTIONKIT_FFMPEG` overrides the search with an explicit binary path.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{FFmpegError, FFmpegResult};
use crate::core::process::configure_std_command;

/// Environment variable naming an explicit ffmpeg binary
pub const FFMPEG_ENV_VAR: &str = "CAPTIONKIT_FFMPEG";

#[cfg(target_os = "windows")]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const FFMPEG_BINARY: &str = "ffmpeg";

#[cfg(target_os = "windows")]
const FFPROBE_BINARY: &str = "ffprobe.exe";
#[cfg(not(target_os = "windows"))]
const FFPROBE_BINARY: &str = "ffprobe";

/// Information about detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to ffprobe binary, when one sits next to ffmpeg or on PATH
    pub ffprobe_path: Option<PathBuf>,
    /// FFmpeg version string
    pub version: String,
}

/// Detects FFmpeg: environment override first, then common paths and PATH.
pub fn detect_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    match std::env::var_os(FFMPEG_ENV_VAR) {
        Some(path) if !path.is_empty() => detect_at(Path::new(&path)),
        _ => detect_system_ffmpeg(),
    }
}

/// Uses an explicit ffmpeg binary; ffprobe is looked up beside it.
pub fn detect_at(ffmpeg_path: &Path) -> FFmpegResult<FFmpegInfo> {
    if !ffmpeg_path.is_file() {
        return Err(FFmpegError::NotFound);
    }

    let ffprobe_path = ffmpeg_path
        .parent()
        .map(|dir| dir.join(FFPROBE_BINARY))
        .filter(|p| p.is_file());

    Ok(FFmpegInfo {
        version: get_ffmpeg_version(ffmpeg_path)?,
        ffmpeg_path: ffmpeg_path.to_path_buf(),
        ffprobe_path,
    })
}

/// Detect FFmpeg from common install locations and the system PATH
pub fn detect_system_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = which_binary(FFMPEG_BINARY).ok_or(FFmpegError::NotFound)?;
    let ffprobe_path = which_binary(FFPROBE_BINARY);
    let version = get_ffmpeg_version(&ffmpeg_path)?;

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

/// Finds a binary in common locations, then through `which` / `where`
fn which_binary(binary_name: &str) -> Option<PathBuf> {
    if let Some(found) = get_common_ffmpeg_paths()
        .into_iter()
        .map(|dir| dir.join(binary_name))
        .find(|p| p.is_file())
    {
        return Some(found);
    }

    #[cfg(target_os = "windows")]
    let mut cmd = Command::new("where");
    #[cfg(not(target_os = "windows"))]
    let mut cmd = Command::new("which");

    configure_std_command(&mut cmd);
    let output = cmd.arg(binary_name).output().ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| PathBuf::from(line.trim()))
        .filter(|p| !p.as_os_str().is_empty())
}

/// Get common FFmpeg installation paths for the current platform
fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));

        // Chocolatey installation
        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }

        // Scoop installation
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        // Homebrew paths
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin")); // MacPorts
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

/// Get FFmpeg version string
fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let mut cmd = Command::new(ffmpeg_path);
    configure_std_command(&mut cmd);
    let output = cmd
        .arg("-version")
        .output()
        .map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the first line of `ffmpeg -version` ("ffmpeg version X.X.X ...")
fn parse_version(output: &str) -> FFmpegResult<String> {
    let first_line = output
        .lines()
        .next()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("ffmpeg version 6.1.1 Copyright (c) 2000-2023\nbuilt with gcc").unwrap(),
            "6.1.1"
        );
        assert_eq!(parse_version("custom build").unwrap(), "custom build");
        assert!(parse_version("").is_err());
    }

    #[test]
    fn test_detect_at_missing_binary() {
        let err = detect_at(Path::new("/definitely/not/here/ffmpeg")).unwrap_err();
        assert!(matches!(err, FFmpegError::NotFound));
    }

    #[test]
    fn test_detect_system_ffmpeg() {
        // Passes whether or not FFmpeg is installed on the machine
        match detect_system_ffmpeg() {
            Ok(info) => assert!(!info.version.is_empty()),
            Err(FFmpegError::NotFound) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
