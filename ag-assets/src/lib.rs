//! The on-disk convention that maps `assignment_id → exercise_id →
//! {*Test.py, *_context.py, *_inline.py, *_template.py, empty_submission.py}`
//! (spec.md §3 "Asset tree", §4.2 asset layout).
//!
//! Mirrors the path-builder style of the teacher's `util::paths` module,
//! adapted from `{module_id}/{assignment_id}` integer keys to this system's
//! `assignment_id`/`exercise_id` string keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("assignment directory not found: {0}")]
    AssignmentNotFound(String),

    #[error("exercise directory not found: {assignment_id}/{exercise_id}")]
    ExerciseNotFound {
        assignment_id: String,
        exercise_id: String,
    },

    #[error("io error reading asset tree: {0}")]
    Io(#[from] std::io::Error),
}

/// Root of the read-only asset tree (one directory per assignment id).
#[derive(Debug, Clone)]
pub struct AssetTree {
    root: PathBuf,
}

impl AssetTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AssetTree { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assignment_dir(&self, assignment_id: &str) -> PathBuf {
        self.root.join(assignment_id)
    }

    pub fn exercise_dir(&self, assignment_id: &str, exercise_id: &str) -> PathBuf {
        self.assignment_dir(assignment_id).join(exercise_id)
    }

    /// Resolves an assignment directory, erroring if it doesn't exist
    /// (spec.md §4.5 step 2: "Resolve the assignment directory. Missing →
    /// fail with id-carrying error.").
    pub fn resolve_assignment(&self, assignment_id: &str) -> Result<PathBuf, AssetError> {
        let dir = self.assignment_dir(assignment_id);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(AssetError::AssignmentNotFound(assignment_id.to_string()))
        }
    }

    /// Resolves an exercise directory, erroring if it doesn't exist.
    pub fn resolve_exercise(
        &self,
        assignment_id: &str,
        exercise_id: &str,
    ) -> Result<PathBuf, AssetError> {
        let dir = self.exercise_dir(assignment_id, exercise_id);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(AssetError::ExerciseNotFound {
                assignment_id: assignment_id.to_string(),
                exercise_id: exercise_id.to_string(),
            })
        }
    }

    /// Path to the exercise's trivial-submission marker file.
    pub fn empty_submission_path(&self, assignment_id: &str, exercise_id: &str) -> PathBuf {
        self.exercise_dir(assignment_id, exercise_id)
            .join("empty_submission.py")
    }
}

/// One inline-test pair discovered in an exercise directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineTestPair {
    pub name: String,
    pub context_path: PathBuf,
    pub inline_path: PathBuf,
}

/// The classified contents of a single exercise directory (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct ExerciseAssets {
    /// `<ClassName>Test.py` files, keyed by class name.
    pub unit_tests: BTreeMap<String, PathBuf>,
    /// `<Name>_context.py` + `<Name>_inline.py` pairs, keyed by name.
    pub inline_tests: BTreeMap<String, InlineTestPair>,
    /// `<Name>_template.py` report templates, keyed by name.
    pub templates: BTreeMap<String, PathBuf>,
    pub empty_submission: Option<PathBuf>,
}

/// Walks an exercise directory and classifies its files by the asset-layout
/// convention (spec.md §3, §4.2 table).
pub fn discover_exercise_assets(dir: &Path) -> Result<ExerciseAssets, AssetError> {
    let mut assets = ExerciseAssets::default();
    let mut context_stems: Vec<String> = Vec::new();
    let mut inline_stems: Vec<String> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if name == "empty_submission.py" {
            assets.empty_submission = Some(path);
        } else if let Some(class_name) = name.strip_suffix("Test.py") {
            assets.unit_tests.insert(class_name.to_string(), path);
        } else if let Some(stem) = name.strip_suffix("_context.py") {
            context_stems.push(stem.to_string());
        } else if let Some(stem) = name.strip_suffix("_inline.py") {
            inline_stems.push(stem.to_string());
        } else if let Some(stem) = name.strip_suffix("_template.py") {
            assets.templates.insert(stem.to_string(), path);
        }
    }

    for stem in context_stems {
        if inline_stems.contains(&stem) {
            assets.inline_tests.insert(
                stem.clone(),
                InlineTestPair {
                    name: stem.clone(),
                    context_path: dir.join(format!("{stem}_context.py")),
                    inline_path: dir.join(format!("{stem}_inline.py")),
                },
            );
        }
    }

    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn classifies_a_typical_exercise_directory() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("FizzBuzzTest.py"), "").unwrap();
        fs::write(p.join("basic_context.py"), "x = 1\n").unwrap();
        fs::write(p.join("basic_inline.py"), "assert x == 1\n").unwrap();
        fs::write(p.join("report_template.py"), "").unwrap();
        fs::write(p.join("empty_submission.py"), "# TODO\n").unwrap();

        let assets = discover_exercise_assets(p).unwrap();
        assert!(assets.unit_tests.contains_key("FizzBuzz"));
        assert!(assets.inline_tests.contains_key("basic"));
        assert!(assets.templates.contains_key("report"));
        assert!(assets.empty_submission.is_some());
    }

    #[test]
    fn orphan_context_without_inline_is_not_paired() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lonely_context.py"), "").unwrap();
        let assets = discover_exercise_assets(dir.path()).unwrap();
        assert!(assets.inline_tests.is_empty());
    }

    #[test]
    fn resolve_assignment_errors_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let tree = AssetTree::new(dir.path());
        let err = tree.resolve_assignment("nope").unwrap_err();
        assert!(matches!(err, AssetError::AssignmentNotFound(_)));
    }
}
