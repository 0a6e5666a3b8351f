//! Backup reconciliation
//!
//! Reports names present on only one side of two directories. Never touches
//! the files themselves.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::utils::DateFilter;

#[derive(Debug, Clone, Default)]
pub(crate) struct DiffOptions {
    pub(crate) extension: Option<String>,
    pub(crate) dates: DateFilter,
    /// Compare relative paths of the whole tree instead of top-level names
    pub(crate) recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct DirDiff {
    pub(crate) only_in_left: Vec<String>,
    pub(crate) only_in_right: Vec<String>,
}

impl DirDiff {
    pub(crate) fn is_empty(&self) -> bool {
        self.only_in_left.is_empty() && self.only_in_right.is_empty()
    }
}

/// Whether `name` ends in `.<ext>`; the extension may be given with or without the dot.
pub(crate) fn has_extension(name: &str, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == ext)
}

fn io_error(path: &Path, source: std::io::Error) -> AppError {
    AppError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn top_level_names(dir: &Path) -> Result<BTreeSet<String>, AppError> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

fn tree_names(dir: &Path) -> Result<BTreeSet<String>, AppError> {
    let mut names = BTreeSet::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current).map_err(|e| io_error(&current, e))? {
            let entry = entry.map_err(|e| io_error(&current, e))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if let Ok(rel) = path.strip_prefix(dir) {
                let parts: Vec<_> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect();
                names.insert(parts.join("/"));
            }
        }
    }
    Ok(names)
}

/// Compare two directories and list what each has that the other lacks.
pub(crate) fn diff_dirs(
    left: &Path,
    right: &Path,
    options: &DiffOptions,
) -> Result<DirDiff, AppError> {
    for dir in [left, right] {
        if !dir.is_dir() {
            return Err(AppError::MissingDirectory {
                path: dir.to_path_buf(),
            });
        }
    }

    let list = |dir: &Path| {
        if options.recursive {
            tree_names(dir)
        } else {
            top_level_names(dir)
        }
    };
    let left_names = list(left)?;
    let right_names = list(right)?;

    let keep = |name: &&String| {
        let file_name = name.rsplit('/').next().unwrap_or(name);
        options
            .extension
            .as_deref()
            .is_none_or(|ext| has_extension(file_name, ext))
            && options.dates.admits_name(file_name)
    };

    Ok(DirDiff {
        only_in_left: left_names
            .difference(&right_names)
            .filter(keep)
            .cloned()
            .collect(),
        only_in_right: right_names
            .difference(&left_names)
            .filter(keep)
            .cloned()
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn populate(dir: &Path, names: &[&str]) {
        for name in names {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"x").unwrap();
        }
    }

    fn pair() -> (TempDir, TempDir) {
        let left = TempDir::new().unwrap();
        let right = TempDir::new().unwrap();
        populate(
            left.path(),
            &[
                "rach3_2022-03-15_a.mid",
                "rach3_2022-03-16_a.mid",
                "rach3_2022-03-16_a.flac",
                "shared.mid",
            ],
        );
        populate(
            right.path(),
            &["shared.mid", "rach3_2022-04-01_b.mid", "extra.txt"],
        );
        (left, right)
    }

    #[test]
    fn reports_both_sides() {
        let (left, right) = pair();
        let diff = diff_dirs(left.path(), right.path(), &DiffOptions::default()).unwrap();
        assert_eq!(
            diff.only_in_left,
            vec![
                "rach3_2022-03-15_a.mid",
                "rach3_2022-03-16_a.flac",
                "rach3_2022-03-16_a.mid"
            ]
        );
        assert_eq!(diff.only_in_right, vec!["extra.txt", "rach3_2022-04-01_b.mid"]);
    }

    #[test]
    fn swapping_sides_swaps_results() {
        let (left, right) = pair();
        let options = DiffOptions::default();
        let forward = diff_dirs(left.path(), right.path(), &options).unwrap();
        let backward = diff_dirs(right.path(), left.path(), &options).unwrap();
        assert_eq!(forward.only_in_left, backward.only_in_right);
        assert_eq!(forward.only_in_right, backward.only_in_left);
    }

    #[test]
    fn extension_filter_applies_to_both_sides() {
        let (left, right) = pair();
        let options = DiffOptions {
            extension: Some("mid".to_string()),
            ..DiffOptions::default()
        };
        let diff = diff_dirs(left.path(), right.path(), &options).unwrap();
        assert_eq!(
            diff.only_in_left,
            vec!["rach3_2022-03-15_a.mid", "rach3_2022-03-16_a.mid"]
        );
        assert_eq!(diff.only_in_right, vec!["rach3_2022-04-01_b.mid"]);
    }

    #[test]
    fn date_filter_excludes_out_of_range_names() {
        let (left, right) = pair();
        let options = DiffOptions {
            dates: DateFilter::new(NaiveDate::from_ymd_opt(2022, 3, 16), None),
            ..DiffOptions::default()
        };
        let diff = diff_dirs(left.path(), right.path(), &options).unwrap();
        assert_eq!(
            diff.only_in_left,
            vec!["rach3_2022-03-16_a.flac", "rach3_2022-03-16_a.mid"]
        );
        assert_eq!(diff.only_in_right, vec!["extra.txt", "rach3_2022-04-01_b.mid"]);
    }

    #[test]
    fn recursive_compares_relative_paths() {
        let left = TempDir::new().unwrap();
        let right = TempDir::new().unwrap();
        populate(left.path(), &["2022/a.mid", "2022/b.mid"]);
        populate(right.path(), &["2022/a.mid", "2023/b.mid"]);

        let flat = diff_dirs(left.path(), right.path(), &DiffOptions::default()).unwrap();
        assert_eq!(flat.only_in_right, vec!["2023"]);

        let options = DiffOptions {
            recursive: true,
            ..DiffOptions::default()
        };
        let deep = diff_dirs(left.path(), right.path(), &options).unwrap();
        assert_eq!(deep.only_in_left, vec!["2022/b.mid"]);
        assert_eq!(deep.only_in_right, vec!["2023/b.mid"]);
    }

    #[test]
    fn identical_dirs_have_no_difference() {
        let (left, _) = pair();
        let diff = diff_dirs(left.path(), left.path(), &DiffOptions::default()).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn missing_directory_is_a_precondition_error() {
        let (left, _) = pair();
        let missing = left.path().join("absent");
        let err = diff_dirs(left.path(), &missing, &DiffOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::MissingDirectory { .. }));
    }

    #[test]
    fn has_extension_accepts_dotted_form() {
        assert!(has_extension("a.mid", "mid"));
        assert!(has_extension("a.mid", ".mid"));
        assert!(!has_extension("a.midi", "mid"));
        assert!(!has_extension("mid", "mid"));
    }
}
