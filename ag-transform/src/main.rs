//! Authoring-time CLI for the master-notebook markup transformer (spec.md
//! §6 "CLI surface"): `--command parse|student|autograder`.
//!
//! Grounded on `clap::Parser`, the flag-parsing crate the retrieval pack
//! reaches for whenever a binary takes named flags rather than the bare
//! positional args the teacher's own `migration`/`seeder` binaries parse by
//! hand (SPEC_FULL.md §2).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use ag_markup::Transformer;
use ag_notebook::{Cell, Notebook};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Command {
    /// Parse the input notebook and re-emit it unchanged (round-trip check).
    Parse,
    /// Emit the student notebook (solutions stripped, hidden markup removed).
    Student,
    /// Emit the autograder asset tree under `--output`.
    Autograder,
}

/// Authoring-time compiler from a master notebook to its student and
/// autograder derivatives (spec.md §4.2).
#[derive(Debug, Parser)]
#[command(name = "ag-transform", version, about)]
struct Args {
    #[arg(long, value_enum)]
    command: Command,

    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    /// Two-letter language filter for `**lang:xx**`-tagged markdown cells.
    #[arg(long)]
    language: Option<String>,

    /// A code cell prepended to the emitted student notebook.
    #[arg(long)]
    preamble: Option<PathBuf>,
}

fn main() -> ExitCode {
    ag_common::logger::init_logger("info");

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ag-transform failed");
            eprintln!("ag-transform: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(&args.input)?;
    let master = Notebook::parse(&bytes)?;

    match args.command {
        Command::Parse => {
            fs::write(&args.output, master.emit())?;
        }
        Command::Student => {
            let transformer = Transformer::new(args.language.clone());
            let mut student = transformer.to_student(&master)?;

            if let Some(preamble_path) = &args.preamble {
                let preamble_source = fs::read_to_string(preamble_path)?;
                student.cells.insert(0, Cell::new_code(preamble_source));
            }

            fs::write(&args.output, student.emit())?;
        }
        Command::Autograder => {
            fs::create_dir_all(&args.output)?;
            let transformer = Transformer::new(args.language.clone());
            let manifest = transformer.to_autograder(&master, &args.output)?;
            tracing::info!(count = manifest.files.len(), root = %args.output.display(), "wrote autograder asset tree");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_master() -> Vec<u8> {
        serde_json::json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {"assignment_id": "assign1"},
            "cells": [
                {
                    "cell_type": "markdown",
                    "metadata": {},
                    "source": ["# EXERCISE METADATA\n", "```yaml\n", "exercise_id: ex1\n", "```\n"]
                },
                {
                    "cell_type": "code",
                    "metadata": {"exercise_id": "ex1"},
                    "source": ["%%solution\n", "# BEGIN SOLUTION\n", "x = 1\n", "# END SOLUTION\n"],
                    "outputs": [],
                    "execution_count": null
                }
            ]
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn parse_round_trips_to_output_file() {
        let input_dir = tempfile::tempdir().unwrap();
        let input_path = input_dir.path().join("master.ipynb");
        fs::write(&input_path, sample_master()).unwrap();
        let output_path = input_dir.path().join("out.ipynb");

        let args = Args {
            command: Command::Parse,
            input: input_path,
            output: output_path.clone(),
            language: None,
            preamble: None,
        };
        run(&args).unwrap();

        let reparsed = Notebook::parse(&fs::read(&output_path).unwrap()).unwrap();
        assert_eq!(reparsed.assignment_id(), Some("assign1"));
    }

    #[test]
    fn student_command_prepends_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("master.ipynb");
        fs::write(&input_path, sample_master()).unwrap();
        let output_path = dir.path().join("student.ipynb");
        let preamble_path = dir.path().join("preamble.py");
        let mut f = fs::File::create(&preamble_path).unwrap();
        writeln!(f, "import this").unwrap();

        let args = Args {
            command: Command::Student,
            input: input_path,
            output: output_path.clone(),
            language: None,
            preamble: Some(preamble_path),
        };
        run(&args).unwrap();

        let student = Notebook::parse(&fs::read(&output_path).unwrap()).unwrap();
        assert_eq!(student.cells[0].source.trim(), "import this");
    }

    #[test]
    fn autograder_command_writes_asset_tree() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("master.ipynb");
        fs::write(&input_path, sample_master()).unwrap();
        let output_dir = dir.path().join("assets");

        let args = Args {
            command: Command::Autograder,
            input: input_path,
            output: output_dir.clone(),
            language: None,
            preamble: None,
        };
        run(&args).unwrap();

        assert!(output_dir.join("assign1/ex1/empty_submission.py").exists());
    }
}
