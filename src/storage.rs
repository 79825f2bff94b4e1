// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for recordings and still images
//!
//! Recordings are named by their start time (`20180510_142233.mp4`); the
//! playlist is rebuilt from those names.

use crate::constants::recording::{FILENAME_FORMAT, PHOTO_PREFIX};
use crate::media::encoders::ContainerFormat;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions listed as recordings
const RECORDING_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "webm"];

/// A recording found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingEntry {
    pub path: PathBuf,
    /// Start time parsed from the file name, if it follows the naming scheme
    pub started_at: Option<DateTime<Local>>,
    /// Size in bytes
    pub size: u64,
}

/// `yyyyMMdd_HHmmss.<ext>`
pub fn recording_file_name(started_at: DateTime<Local>, extension: &str) -> String {
    format!("{}.{}", started_at.format(FILENAME_FORMAT), extension)
}

/// `IMG_yyyyMMdd_HHmmss.jpg`
pub fn photo_file_name(taken_at: DateTime<Local>) -> String {
    format!("{}{}.jpg", PHOTO_PREFIX, taken_at.format(FILENAME_FORMAT))
}

/// Recover the start time from a recording or photo file name
///
/// A numeric suffix added for uniqueness (`20180510_142233_2.mp4`) is ignored.
pub fn timestamp_from_file_name(name: &str) -> Option<DateTime<Local>> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    let stem = stem.strip_prefix(PHOTO_PREFIX).unwrap_or(stem);
    // yyyyMMdd_HHmmss
    let stamp = stem.get(..15)?;
    let naive = NaiveDateTime::parse_from_str(stamp, FILENAME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Pick an unused path in `dir` for a recording starting at `now`
///
/// Creates `dir` if needed. Two recordings started within the same second
/// get `_2`, `_3`, ... suffixes.
pub fn allocate_output_path(
    dir: &Path,
    now: DateTime<Local>,
    extension: &str,
) -> io::Result<PathBuf> {
    allocate_named(dir, "", now, extension)
}

/// Allocate a photo path in `dir`, same rules as recordings
pub fn allocate_photo_path(dir: &Path, now: DateTime<Local>) -> io::Result<PathBuf> {
    allocate_named(dir, PHOTO_PREFIX, now, "jpg")
}

fn allocate_named(
    dir: &Path,
    prefix: &str,
    now: DateTime<Local>,
    extension: &str,
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let base = format!("{}{}", prefix, now.format(FILENAME_FORMAT));
    let mut candidate = dir.join(format!("{}.{}", base, extension));
    let mut suffix = 2u32;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", base, suffix, extension));
        suffix += 1;
    }

    debug!(path = %candidate.display(), "Allocated output path");
    Ok(candidate)
}

fn is_recording(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            RECORDING_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
                || ContainerFormat::from_extension(ext).is_some()
        })
        .unwrap_or(false)
}

/// List recordings in `dir`, newest first
///
/// A missing directory is an empty playlist.
pub fn list_recordings(dir: &Path) -> io::Result<Vec<RecordingEntry>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut recordings: Vec<(RecordingEntry, Option<std::time::SystemTime>)> = entries
        .flatten()
        .filter(|entry| is_recording(&entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let path = entry.path();
            let started_at = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(timestamp_from_file_name);
            Some((
                RecordingEntry {
                    path,
                    started_at,
                    size: metadata.len(),
                },
                metadata.modified().ok(),
            ))
        })
        .collect();

    // Name timestamp first, modification time for files outside the scheme
    recordings.sort_by(|(a, a_mtime), (b, b_mtime)| {
        b.started_at
            .cmp(&a.started_at)
            .then_with(|| b_mtime.cmp(a_mtime))
            .then_with(|| b.path.cmp(&a.path))
    });

    Ok(recordings.into_iter().map(|(entry, _)| entry).collect())
}

pub fn delete_recording(path: &Path) -> io::Result<()> {
    std::fs::remove_file(path)?;
    info!(path = %path.display(), "Deleted recording");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2018, 5, 10, h, m, s)
            .earliest()
            .unwrap()
    }

    #[test]
    fn test_recording_file_name() {
        assert_eq!(recording_file_name(at(14, 22, 33), "mp4"), "20180510_142233.mp4");
        assert_eq!(photo_file_name(at(14, 22, 33)), "IMG_20180510_142233.jpg");
    }

    #[test]
    fn test_timestamp_round_trip() {
        let parsed = timestamp_from_file_name("20180510_142233.mp4").unwrap();
        assert_eq!(parsed, at(14, 22, 33));
        let parsed = timestamp_from_file_name("20180510_142233_2.mkv").unwrap();
        assert_eq!(parsed.second(), 33);
        let parsed = timestamp_from_file_name("IMG_20180510_142233.jpg").unwrap();
        assert_eq!(parsed.minute(), 22);
        assert!(timestamp_from_file_name("holiday.mp4").is_none());
    }

    #[test]
    fn test_allocate_adds_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let first = allocate_output_path(dir.path(), at(9, 0, 0), "mp4").unwrap();
        std::fs::write(&first, b"x").unwrap();
        let second = allocate_output_path(dir.path(), at(9, 0, 0), "mp4").unwrap();
        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "20180510_090000_2.mp4");
    }

    #[test]
    fn test_allocate_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = allocate_output_path(&nested, at(9, 0, 0), "mkv").unwrap();
        assert!(nested.is_dir());
        assert_eq!(path.parent().unwrap(), nested);
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20180510_090000.mp4"), b"aa").unwrap();
        std::fs::write(dir.path().join("20180511_090000.mkv"), b"bbb").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let list = list_recordings(dir.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].path.ends_with("20180511_090000.mkv"));
        assert_eq!(list[0].size, 3);
        assert!(list[1].started_at.is_some());
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_recordings(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_delete_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20180510_090000.mp4");
        std::fs::write(&path, b"x").unwrap();
        delete_recording(&path).unwrap();
        assert!(!path.exists());
        assert!(delete_recording(&path).is_err());
    }
}
