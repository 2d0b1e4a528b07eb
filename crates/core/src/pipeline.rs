use crate::config::SortOptions;
use crate::extractor::{DateExtractor, TagDecoder};
use crate::models::{DateResolution, PlacementDecision, UnknownReason};
use crate::placement::{self, Applied, PlacementError};
use crate::scanner::Walker;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a single file's trip through the pipeline ended.
#[derive(Debug)]
pub enum FileOutcome {
    /// Dry run: the mapping was computed and nothing was touched.
    Reported(PlacementDecision),
    Placed(PlacementDecision),
    SkippedNoDate { path: PathBuf },
    SkippedOddDate { path: PathBuf, raw: String },
    SkippedExists(PlacementDecision),
    /// Metadata could not be decoded.
    SkippedUndecodable { path: PathBuf, message: String },
    Failed { path: PathBuf, error: PlacementError },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Reported(d) | FileOutcome::Placed(d) | FileOutcome::SkippedExists(d) => {
                &d.source
            }
            FileOutcome::SkippedNoDate { path }
            | FileOutcome::SkippedOddDate { path, .. }
            | FileOutcome::SkippedUndecodable { path, .. }
            | FileOutcome::Failed { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub seen: usize,
    pub reported: usize,
    pub placed: usize,
    pub skipped_no_date: usize,
    pub skipped_odd_date: usize,
    pub skipped_exists: usize,
    pub skipped_undecodable: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        self.seen += 1;
        match outcome {
            FileOutcome::Reported(_) => self.reported += 1,
            FileOutcome::Placed(_) => self.placed += 1,
            FileOutcome::SkippedNoDate { .. } => self.skipped_no_date += 1,
            FileOutcome::SkippedOddDate { .. } => self.skipped_odd_date += 1,
            FileOutcome::SkippedExists(_) => self.skipped_exists += 1,
            FileOutcome::SkippedUndecodable { .. } => self.skipped_undecodable += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

pub struct Sorter<'a> {
    options: &'a SortOptions,
    decoder: &'a dyn TagDecoder,
    walker: Walker,
}

impl<'a> Sorter<'a> {
    pub fn new(options: &'a SortOptions, decoder: &'a dyn TagDecoder) -> anyhow::Result<Self> {
        let walker = Walker::new(options.recurse, &options.exclude)?;
        Ok(Self {
            options,
            decoder,
            walker,
        })
    }

    /// Sorts every file reachable from `inputs`, handing each outcome to
    /// `on_outcome` as soon as it is known.
    pub fn run(&self, inputs: &[PathBuf], mut on_outcome: impl FnMut(&FileOutcome)) -> RunSummary {
        let mut summary = RunSummary::default();
        for input in inputs {
            self.walker.walk(input, |path| {
                let outcome = self.process_file(&path);
                summary.record(&outcome);
                on_outcome(&outcome);
            });
        }
        info!(
            "Sort complete. {} files, {} placed, {} reported, {} skipped, {} failed.",
            summary.seen,
            summary.placed,
            summary.reported,
            summary.skipped_no_date
                + summary.skipped_odd_date
                + summary.skipped_exists
                + summary.skipped_undecodable,
            summary.failed
        );
        summary
    }

    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let extractor = DateExtractor::new(self.decoder, &self.options.date_tags);
        let date = match extractor.extract(path) {
            Ok(DateResolution::Resolved(date)) => date,
            Ok(DateResolution::Unknown(UnknownReason::Malformed { raw })) => {
                return FileOutcome::SkippedOddDate {
                    path: path.to_path_buf(),
                    raw,
                }
            }
            Ok(DateResolution::Unknown(_)) => {
                return FileOutcome::SkippedNoDate {
                    path: path.to_path_buf(),
                }
            }
            Err(e) => {
                return FileOutcome::SkippedUndecodable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        };
        debug!("{:?} taken {}", path, date);

        let decision = match placement::resolve_placement(path, &date, self.options) {
            Ok(d) => d,
            Err(error) => {
                return FileOutcome::Failed {
                    path: path.to_path_buf(),
                    error,
                }
            }
        };
        match placement::apply(&decision, self.options.copy_then_delete) {
            Ok(Applied::Reported) => FileOutcome::Reported(decision),
            Ok(Applied::Placed) => FileOutcome::Placed(decision),
            Ok(Applied::Exists) => FileOutcome::SkippedExists(decision),
            Err(error) => FileOutcome::Failed {
                path: path.to_path_buf(),
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::DecodeError;
    use crate::models::{DateValue, TagSet};
    use std::fs::{self, File};
    use std::io::{BufReader, Read};

    /// Treats the file body as the `Image DateTime` value; `!` marks an
    /// undecodable file and an empty body has no tags.
    struct BodyAsDate;

    impl TagDecoder for BodyAsDate {
        fn decode(&self, file: &mut BufReader<File>) -> Result<TagSet, DecodeError> {
            let mut body = String::new();
            file.read_to_string(&mut body)?;
            let mut tags = TagSet::new();
            match body.as_str() {
                "" => {}
                "!" => return Err(DecodeError::Invalid("bad header".into())),
                text => tags.insert("Image DateTime", DateValue::RawString(text.into())),
            }
            Ok(tags)
        }
    }

    #[test]
    fn one_bad_file_does_not_stop_the_batch() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("in");
        let out = temp.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(src.join("good.jpg"), "2020:03:15 10:22:00").unwrap();
        fs::write(src.join("odd.jpg"), "not-a-date").unwrap();
        fs::write(src.join("none.jpg"), "").unwrap();
        fs::write(src.join("broken.jpg"), "!").unwrap();

        let mut opts = SortOptions::new(&out);
        opts.action = crate::models::PlacementAction::Move;
        let sorter = Sorter::new(&opts, &BodyAsDate).unwrap();
        let mut outcomes = Vec::new();
        let summary = sorter.run(&[src.clone(), src.join("absent.jpg")], |o| {
            outcomes.push(o.path().to_path_buf())
        });

        assert_eq!(summary.seen, 5);
        assert_eq!(outcomes.len(), 5);
        assert_eq!(summary.placed, 1);
        assert_eq!(summary.skipped_odd_date, 1);
        assert_eq!(summary.skipped_no_date, 2);
        assert_eq!(summary.skipped_undecodable, 1);
        assert!(out.join("2020-03-15/good.jpg").exists());
        assert!(src.join("odd.jpg").exists());
    }

    #[test]
    fn placement_failure_is_reported_per_file() {
        let temp = tempfile::tempdir().unwrap();
        let photo = temp.path().join("a.jpg");
        fs::write(&photo, "2021:01:02 03:04:05").unwrap();
        let opts = SortOptions::new(temp.path().join("no/such/root"));
        let sorter = Sorter::new(&opts, &BodyAsDate).unwrap();
        match sorter.process_file(&photo) {
            FileOutcome::Failed { error, .. } => {
                assert!(matches!(error, PlacementError::CreateDir { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
