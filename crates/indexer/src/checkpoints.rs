//! Checkpoint file discovery. A checkpoint is `<end_block>.json.lst`, one
//! JSON block per line, named for the block number its last line reaches.

use std::{
    fs,
    path::{Path, PathBuf}
};

use tracing::warn;

use crate::IndexerError;

/// Enumerate checkpoint files under `dir`, ascending by end block. A
/// missing directory is simply no checkpoints.
pub fn checkpoint_files(dir: &Path) -> Result<Vec<(u32, PathBuf)>, IndexerError> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files)
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(stem) = name.strip_suffix(".json.lst") else { continue };
        match stem.parse::<u32>() {
            Ok(num) => files.push((num, entry.path())),
            Err(_) => warn!(target: "sync", file = %name, "checkpoint without a block number")
        }
    }
    files.sort_by_key(|(num, _)| *num);
    Ok(files)
}
