//! Tileset and level files on disk, including the custom-level directory scan.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::level::validate_level;
use crate::tiled::Tileset;

/// File extensions recognised as level maps.
pub const LEVEL_EXTENSIONS: [&str; 2] = ["json", "tmj"];

pub fn load_tileset_file(path: &Path) -> Result<Tileset> {
    let data = fs::read(path).with_context(|| format!("read tileset {}", path.display()))?;
    Tileset::from_slice(&data).with_context(|| format!("decode tileset {}", path.display()))
}

pub fn read_level_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read level {}", path.display()))
}

#[derive(Debug)]
pub struct RejectedLevel {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Result of scanning a custom-level directory.
#[derive(Debug, Default)]
pub struct LevelScan {
    /// Playable levels, sorted by path.
    pub accepted: Vec<PathBuf>,
    pub rejected: Vec<RejectedLevel>,
}

/// Validate every level file directly inside `dir` under a `max_steps` cap.
///
/// A missing directory yields an empty scan. Broken levels are logged and
/// reported in [`LevelScan::rejected`]; they never abort the scan.
pub fn scan_custom_levels(dir: &Path, tileset: &Tileset, max_steps: usize) -> Result<LevelScan> {
    let mut scan = LevelScan::default();
    if !dir.exists() {
        debug!(dir = %dir.display(), "custom level directory missing");
        return Ok(scan);
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && has_level_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        let checked = read_level_file(&path).and_then(|data| {
            validate_level(tileset, &data, max_steps)
                .with_context(|| format!("validate {}", path.display()))
        });
        match checked {
            Ok(()) => scan.accepted.push(path),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{error:#}"),
                    "skipping custom level"
                );
                scan.rejected.push(RejectedLevel { path, error });
            }
        }
    }

    info!(
        dir = %dir.display(),
        accepted = scan.accepted.len(),
        rejected = scan.rejected.len(),
        "scanned custom levels"
    );
    Ok(scan)
}

fn has_level_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LEVEL_EXTENSIONS.contains(&ext))
}
