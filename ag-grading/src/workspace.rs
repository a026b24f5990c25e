//! Scratch workspace materialization (spec.md §3 "Scratch workspace", §4.5
//! steps b/c): per-submission, per-exercise ephemeral directories populated
//! by shallow-copying exercise files and synthesizing the files the
//! submission and inline tests need to run.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use ag_assets::ExerciseAssets;

use crate::config::{GradingConfig, ScratchCollisionPolicy};
use crate::error::GradingError;

/// Creates (or reuses, per collision policy) `<scratch_root>/<submission_id>/`
/// (spec.md §4.5 step 3).
pub fn prepare_submission_scratch(
    scratch_root: &Path,
    submission_id: &str,
    config: &GradingConfig,
) -> Result<PathBuf, GradingError> {
    let dir = scratch_root.join(submission_id);
    let io_err = |source: std::io::Error| GradingError::Io {
        submission_id: submission_id.to_string(),
        source,
    };

    if dir.exists() {
        if config.auto_remove_existing_scratch || config.on_scratch_collision == ScratchCollisionPolicy::Overwrite {
            fs::remove_dir_all(&dir).map_err(io_err)?;
        } else {
            return Err(GradingError::ScratchCollision {
                submission_id: submission_id.to_string(),
                path: dir.display().to_string(),
            });
        }
    }
    fs::create_dir_all(&dir).map_err(io_err)?;
    Ok(dir)
}

/// Shallow-copies an exercise directory's files into the submission's
/// per-exercise scratch directory, symlinking any subdirectories (spec.md
/// §4.5 step b: "Shallow-copy the exercise directory's files; symlink any
/// subdirectories").
pub fn copy_exercise_files(
    submission_id: &str,
    exercise_source_dir: &Path,
    scratch_exercise_dir: &Path,
) -> Result<(), GradingError> {
    let io_err = |source: std::io::Error| GradingError::Io {
        submission_id: submission_id.to_string(),
        source,
    };

    fs::create_dir_all(scratch_exercise_dir).map_err(io_err)?;
    for entry in fs::read_dir(exercise_source_dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let dest = scratch_exercise_dir.join(entry.file_name());
        if path.is_dir() {
            let _ = symlink(&path, &dest);
        } else {
            fs::copy(&path, &dest).map_err(io_err)?;
        }
    }
    Ok(())
}

/// Writes `submission.py` and `submission_source.py` into the scratch
/// exercise directory (spec.md §4.5 step b).
pub fn write_submission_files(
    submission_id: &str,
    scratch_exercise_dir: &Path,
    submission_text: &str,
) -> Result<(), GradingError> {
    let io_err = |source: std::io::Error| GradingError::Io {
        submission_id: submission_id.to_string(),
        source,
    };
    fs::write(scratch_exercise_dir.join("submission.py"), submission_text).map_err(io_err)?;
    fs::write(
        scratch_exercise_dir.join("submission_source.py"),
        ag_notebook::wrap_as_source_assignment(submission_text),
    )
    .map_err(io_err)?;
    Ok(())
}

/// Synthesizes `<Name>_inlinetest.py` for each `<Name>_context.py` /
/// `<Name>_inline.py` pair discovered in the exercise (spec.md §4.5 step c).
pub fn synthesize_inline_tests(
    submission_id: &str,
    assets: &ExerciseAssets,
    scratch_exercise_dir: &Path,
    submission_text: &str,
) -> Result<(), GradingError> {
    let io_err = |source: std::io::Error| GradingError::Io {
        submission_id: submission_id.to_string(),
        source,
    };

    for (name, pair) in &assets.inline_tests {
        let context = fs::read_to_string(&pair.context_path).map_err(io_err)?;
        let inline = fs::read_to_string(&pair.inline_path).map_err(io_err)?;
        let script = ag_inline::assemble_inline_test(Some(&context), submission_text, &inline);
        fs::write(
            scratch_exercise_dir.join(format!("{name}_inlinetest.py")),
            script,
        )
        .map_err(io_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_assets::discover_exercise_assets;

    #[test]
    fn copies_files_and_symlinks_dirs() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("FooTest.py"), "x").unwrap();
        fs::create_dir(src.path().join("fixtures")).unwrap();
        fs::write(src.path().join("fixtures/data.txt"), "y").unwrap();

        let dst = tempfile::tempdir().unwrap();
        let scratch = dst.path().join("ex1");
        copy_exercise_files("sub1", src.path(), &scratch).unwrap();

        assert!(scratch.join("FooTest.py").is_file());
        assert!(scratch.join("fixtures").is_dir());
        assert!(scratch.join("fixtures/data.txt").exists());
    }

    #[test]
    fn writes_submission_and_source_files() {
        let dst = tempfile::tempdir().unwrap();
        write_submission_files("sub1", dst.path(), "x = 1\n").unwrap();
        let sub = fs::read_to_string(dst.path().join("submission.py")).unwrap();
        assert_eq!(sub, "x = 1\n");
        let src = fs::read_to_string(dst.path().join("submission_source.py")).unwrap();
        assert!(src.starts_with("source = \"\"\""));
    }

    #[test]
    fn synthesizes_inlinetest_files_for_each_pair() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("basic_context.py"), "x = 0\n").unwrap();
        fs::write(dir.path().join("basic_inline.py"), "assert x == 1\n").unwrap();
        let assets = discover_exercise_assets(dir.path()).unwrap();

        synthesize_inline_tests("sub1", &assets, dir.path(), "x = 1\n").unwrap();
        let generated = fs::read_to_string(dir.path().join("basic_inlinetest.py")).unwrap();
        assert!(generated.contains("x = 0"));
        assert!(generated.contains("x = 1"));
        assert!(generated.contains("assert x == 1"));
    }

    #[test]
    fn collision_is_rejected_by_default() {
        let root = tempfile::tempdir().unwrap();
        let config = GradingConfig::default();
        prepare_submission_scratch(root.path(), "dup", &config).unwrap();
        let err = prepare_submission_scratch(root.path(), "dup", &config).unwrap_err();
        assert!(matches!(err, GradingError::ScratchCollision { .. }));
    }

    #[test]
    fn auto_remove_wipes_existing_scratch() {
        let root = tempfile::tempdir().unwrap();
        let mut config = GradingConfig::default();
        let dir = prepare_submission_scratch(root.path(), "dup2", &config).unwrap();
        fs::write(dir.join("marker.txt"), "old").unwrap();
        config.auto_remove_existing_scratch = true;
        let dir2 = prepare_submission_scratch(root.path(), "dup2", &config).unwrap();
        assert!(!dir2.join("marker.txt").exists());
    }
}
