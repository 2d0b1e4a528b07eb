use anyhow::{bail, Context, Result};
use clap::Parser;
use photosort_core::config::{AppConfig, SortOptions};
use photosort_core::models::PlacementAction;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "photosort")]
#[command(about = "Sort photos into per-day directories by their EXIF capture date", long_about = None)]
pub struct Cli {
    /// Directories that contain photos to be sorted, or individual photos
    #[arg(required = true, num_args = 1..)]
    pub photos: Vec<PathBuf>,

    /// Destination folder; overrides `sort.dest_dir` from the config
    #[arg(long)]
    pub dest_dir: Option<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recurse: bool,

    /// Do not sort photos. Report how they would be sorted
    #[arg(short, long)]
    pub dry_run: bool,

    /// Move the files. Default is to sym-link them
    #[arg(long)]
    pub move_photos: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Glob patterns to skip while walking directories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Print a JSON summary when done
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Merges flags over configuration. Flags only ever switch features on.
    pub fn sort_options(&self, cfg: &AppConfig) -> Result<SortOptions> {
        let dest_root = match (&self.dest_dir, &cfg.sort.dest_dir) {
            (Some(flag), _) => flag.clone(),
            (None, Some(configured)) => PathBuf::from(configured),
            (None, None) => {
                bail!("no destination: pass --dest-dir or set sort.dest_dir in the config")
            }
        };
        let mut exclude = cfg.scan.exclude.clone();
        exclude.extend(self.exclude.iter().cloned());
        Ok(SortOptions {
            dest_root,
            action: if self.move_photos {
                PlacementAction::Move
            } else {
                cfg.sort.action
            },
            dry_run: self.dry_run,
            recurse: self.recurse || cfg.scan.recurse,
            copy_then_delete: cfg.sort.copy_then_delete,
            exclude,
            date_tags: cfg.extract.date_tags.clone(),
        })
    }
}

/// The destination root must already exist unless nothing will be written.
pub fn check_dest_root(opts: &SortOptions) -> Result<()> {
    if opts.dry_run {
        return Ok(());
    }
    let meta = std::fs::metadata(&opts.dest_root)
        .with_context(|| format!("destination root {:?} is unusable", opts.dest_root))?;
    if !meta.is_dir() {
        bail!("destination root {:?} is not a directory", opts.dest_root);
    }
    Ok(())
}
