//! Maps a dated source file to its destination and carries out the link or move.

use crate::config::SortOptions;
use crate::models::{CaptureDate, DecisionAction, PlacementDecision};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("source has no file name: {0:?}")]
    NoFileName(PathBuf),
    #[error("cannot create directory {dir:?}: {source}")]
    CreateDir { dir: PathBuf, source: io::Error },
    #[error("cannot link {to:?} -> {from:?}: {source}")]
    Link {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("cannot move {from:?} to {to:?}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Dry run; nothing touched.
    Reported,
    Placed,
    /// Something already sits at the destination.
    Exists,
}

pub fn resolve_placement(
    source: &Path,
    date: &CaptureDate,
    options: &SortOptions,
) -> Result<PlacementDecision, PlacementError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| PlacementError::NoFileName(source.to_path_buf()))?;
    let destination_dir = options.dest_root.join(date.day_dir());
    let destination = destination_dir.join(file_name);
    let action = if options.dry_run {
        DecisionAction::Report
    } else {
        options.action.into()
    };
    Ok(PlacementDecision {
        source: source.to_path_buf(),
        destination_dir,
        destination,
        action,
    })
}

pub fn apply(
    decision: &PlacementDecision,
    copy_then_delete: bool,
) -> Result<Applied, PlacementError> {
    let move_by_copy = match decision.action {
        DecisionAction::Report => return Ok(Applied::Reported),
        DecisionAction::Link => None,
        DecisionAction::Move => Some(copy_then_delete),
    };

    let dir = &decision.destination_dir;
    if !dir.exists() {
        debug!("creating {:?}", dir);
        fs::create_dir(dir).map_err(|source| PlacementError::CreateDir {
            dir: dir.clone(),
            source,
        })?;
    }

    // symlink_metadata so a dangling link still counts as occupied.
    if fs::symlink_metadata(&decision.destination).is_ok() {
        return Ok(Applied::Exists);
    }

    let from = &decision.source;
    let to = &decision.destination;
    match move_by_copy {
        None => link(from, to).map_err(|source| PlacementError::Link {
            from: from.clone(),
            to: to.clone(),
            source,
        })?,
        Some(copy) => move_file(from, to, copy).map_err(|source| PlacementError::Move {
            from: from.clone(),
            to: to.clone(),
            source,
        })?,
    }
    Ok(Applied::Placed)
}

fn link(from: &Path, to: &Path) -> io::Result<()> {
    let target = std::path::absolute(from)?;
    debug!("linking {:?} -> {:?}", to, target);
    symlink(&target, to)
}

#[cfg(unix)]
fn symlink(target: &Path, at: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, at)
}

#[cfg(windows)]
fn symlink(target: &Path, at: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, at)
}

fn move_file(from: &Path, to: &Path, copy_then_delete: bool) -> io::Result<()> {
    debug!("moving {:?} -> {:?}", from, to);
    if copy_then_delete {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    } else {
        fs::rename(from, to)?;
    }
    Ok(())
}
