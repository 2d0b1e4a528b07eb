//! Expands input paths into the files to sort, in filesystem listing order.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

pub struct Walker {
    recurse: bool,
    excludes: GlobSet,
}

impl Walker {
    pub fn new(recurse: bool, excludes: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            recurse,
            excludes: build_globset(excludes)?,
        })
    }

    /// Calls `visit` once per file found under `input`. Paths named directly
    /// are always visited, even when they match an exclude pattern or do not exist.
    pub fn walk(&self, input: &Path, mut visit: impl FnMut(PathBuf)) {
        if !input.is_dir() {
            visit(input.to_path_buf());
        } else if self.recurse {
            self.walk_tree(input, &mut visit);
        } else {
            self.walk_flat(input, &mut visit);
        }
    }

    fn walk_tree(&self, root: &Path, visit: &mut impl FnMut(PathBuf)) {
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e.path()));
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };
            // is_dir follows symlinks; linked directories are neither walked nor sorted.
            if entry.path().is_dir() {
                continue;
            }
            visit(entry.into_path());
        }
    }

    fn walk_flat(&self, dir: &Path, visit: &mut impl FnMut(PathBuf)) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot list {:?}: {}", dir, e);
                return;
            }
        };
        for entry in entries {
            let path = match entry {
                Ok(e) => e.path(),
                Err(e) => {
                    warn!("skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };
            // is_file follows symlinks, so links to files are sorted too.
            if path.is_file() && !self.is_excluded(&path) {
                visit(path);
            }
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excludes.is_match(path)
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
