use crate::models::PlacementAction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATE_TAGS: [&str; 2] = ["Image DateTime", "EXIF DateTimeDigitized"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sort: SortConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub dest_dir: Option<String>,
    #[serde(default)]
    pub action: PlacementAction,
    /// Move by copying then removing the source; survives cross-device moves.
    #[serde(default)]
    pub copy_then_delete: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub recurse: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Tags consulted in order; the first one present wins.
    #[serde(default = "default_date_tags")]
    pub date_tags: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            date_tags: default_date_tags(),
        }
    }
}

fn default_date_tags() -> Vec<String> {
    DEFAULT_DATE_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Everything a run needs, fixed at startup and never mutated.
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub dest_root: PathBuf,
    pub action: PlacementAction,
    pub dry_run: bool,
    pub recurse: bool,
    pub copy_then_delete: bool,
    pub exclude: Vec<String>,
    pub date_tags: Vec<String>,
}

impl SortOptions {
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
            action: PlacementAction::default(),
            dry_run: false,
            recurse: false,
            copy_then_delete: false,
            exclude: Vec::new(),
            date_tags: default_date_tags(),
        }
    }

    /// Options taken purely from configuration; `None` when no destination is set.
    pub fn from_config(cfg: &AppConfig) -> Option<Self> {
        let dest_root = cfg.sort.dest_dir.as_ref()?;
        Some(Self {
            dest_root: PathBuf::from(dest_root),
            action: cfg.sort.action,
            dry_run: false,
            recurse: cfg.scan.recurse,
            copy_then_delete: cfg.sort.copy_then_delete,
            exclude: cfg.scan.exclude.clone(),
            date_tags: cfg.extract.date_tags.clone(),
        })
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("photosort").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("PHOTOSORT")
            .prefix_separator("__")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
