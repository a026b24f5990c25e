//! The single left-to-right driver over a master notebook's cells, in the
//! manner of `marker::lib::MarkingJob::mark`'s one-method orchestration:
//! one state machine instead of a generic cell-visitor trait, since the
//! walk has exactly two outputs (student notebook, autograder asset tree)
//! and both need the same running context (spec.md §4.2 "Iteration order
//! matters", §9 "Dynamic magic-based authoring DSL").

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ag_notebook::{Cell, CellType, Notebook};
use serde_json::{Map, Value};

use crate::error::MarkupError;
use crate::magic::{self, CodeCellKind};
use crate::metadata::{self, ASSIGNMENT_MARKER, EXERCISE_MARKER};
use crate::solution;
use crate::unittest;

/// Transforms a master notebook. `language` restricts `**lang:xx**`-tagged
/// markdown cells the way the CLI's `--language` flag does (spec.md §6).
pub struct Transformer {
    pub language: Option<String>,
}

impl Transformer {
    pub fn new(language: Option<String>) -> Self {
        Transformer { language }
    }

    /// Produces the student notebook: solutions replaced by prompts, hidden
    /// tests and generation markers removed (spec.md §4.2, §8 invariant).
    pub fn to_student(&self, master: &Notebook) -> Result<Notebook, MarkupError> {
        let mut out = Notebook::new();
        out.nbformat = master.nbformat;
        out.nbformat_minor = master.nbformat_minor;
        out.metadata = master.metadata.clone();

        let mut ctx = WalkContext::default();

        for cell in &master.cells {
            match cell.cell_type {
                CellType::Markdown => {
                    if let Some(kept) = self.student_markdown(cell, &mut ctx)? {
                        out.cells.push(kept);
                    }
                }
                CellType::Code => {
                    if let Some(kept) = self.student_code(cell, &mut ctx)? {
                        out.cells.push(kept);
                    }
                }
            }
        }

        if let Some(assignment_id) = ctx.assignment_metadata.get("assignment_id").cloned() {
            out.metadata.insert("assignment_id".into(), assignment_id);
        }
        for (k, v) in ctx.assignment_metadata {
            out.metadata.entry(k).or_insert(v);
        }

        Ok(out)
    }

    fn student_markdown(
        &self,
        cell: &Cell,
        ctx: &mut WalkContext,
    ) -> Result<Option<Cell>, MarkupError> {
        if magic::is_master_only(&cell.source) {
            return Ok(None);
        }

        let mut source = cell.source.clone();

        if let Some(block) = metadata::extract_fenced_block(&source, ASSIGNMENT_MARKER)? {
            ctx.assignment_metadata.extend(block.mapping);
            source = block.remaining_source;
        }
        if let Some(block) = metadata::extract_fenced_block(&source, EXERCISE_MARKER)? {
            ctx.start_exercise(block.mapping);
            source = block.remaining_source;
        }

        let (tag, stripped) = magic::extract_language_tag(&source);
        source = stripped;
        if let Some(filter) = &self.language {
            if tag.as_deref() != Some(filter.as_str()) {
                return Ok(None);
            }
        }

        let mut out = cell.clone();
        out.source = source;
        Ok(Some(out))
    }

    fn student_code(&self, cell: &Cell, ctx: &mut WalkContext) -> Result<Option<Cell>, MarkupError> {
        if magic::is_master_only(&cell.source) {
            return Ok(None);
        }

        let kind = magic::classify_code_cell(&cell.source);
        match kind {
            CodeCellKind::MasterOnly => Ok(None),
            CodeCellKind::Solution => {
                let body = magic::strip_first_line(&cell.source);
                let transformed = solution::transform_solution(&body);
                ctx.push_context_line(&body);
                let mut out = cell.clone();
                if let Some(pending) = ctx.take_pending_exercise_metadata() {
                    out.metadata.extend(pending);
                }
                out.source = magic::strip_test_markers(&transformed.student_body);
                Ok(Some(out))
            }
            CodeCellKind::StudentTest { .. } => {
                let body = magic::strip_first_line(&cell.source);
                let mut out = cell.clone();
                out.source = magic::strip_test_markers(&body);
                Ok(Some(out))
            }
            CodeCellKind::InlineTest { .. } | CodeCellKind::Template { .. } => Ok(None),
            CodeCellKind::Plain => {
                ctx.push_context_line(&cell.source);
                let stripped = strip_unittest_blocks(&cell.source);
                let mut out = cell.clone();
                out.source = magic::strip_test_markers(&stripped);
                Ok(Some(out))
            }
        }
    }

    /// Produces the autograder asset tree under `out_root`, one directory
    /// per assignment/exercise (spec.md §3 "Asset tree", §4.2 autograder
    /// column). Returns a manifest of files written, useful for tests.
    pub fn to_autograder(
        &self,
        master: &Notebook,
        out_root: &Path,
    ) -> Result<AutograderManifest, MarkupError> {
        let mut ctx = WalkContext::default();
        let mut manifest = AutograderManifest::default();

        // Assignment metadata conventionally lives in the first markdown
        // cell; a single pre-pass keeps the main walk from needing to
        // special-case "haven't seen it yet" everywhere a path is built.
        for cell in &master.cells {
            if cell.cell_type == CellType::Markdown {
                if let Some(block) =
                    metadata::extract_fenced_block(&cell.source, ASSIGNMENT_MARKER)?
                {
                    ctx.assignment_metadata.extend(block.mapping);
                }
            }
        }
        let assignment_id = ctx
            .assignment_metadata
            .get("assignment_id")
            .and_then(Value::as_str)
            .or_else(|| master.assignment_id())
            .ok_or(MarkupError::MissingAssignmentId)?
            .to_string();
        let assignment_dir = out_root.join(&assignment_id);

        for cell in &master.cells {
            match cell.cell_type {
                CellType::Markdown => {
                    if let Some(block) =
                        metadata::extract_fenced_block(&cell.source, EXERCISE_MARKER)?
                    {
                        ctx.start_exercise(block.mapping);
                    }
                }
                CellType::Code => {
                    self.autograder_code(cell, &mut ctx, &assignment_dir, &mut manifest)?;
                }
            }
        }

        Ok(manifest)
    }

    fn autograder_code(
        &self,
        cell: &Cell,
        ctx: &mut WalkContext,
        assignment_dir: &Path,
        manifest: &mut AutograderManifest,
    ) -> Result<(), MarkupError> {
        let kind = magic::classify_code_cell(&cell.source);
        match kind {
            CodeCellKind::MasterOnly => {
                let body = magic::strip_first_line(&cell.source);
                ctx.push_context_line(&body);
                write_unittest_blocks(&body, ctx, assignment_dir, manifest)?;
            }
            CodeCellKind::Solution => {
                let body = magic::strip_first_line(&cell.source);
                let transformed = solution::transform_solution(&body);
                let exercise_id = ctx
                    .current_exercise_id
                    .clone()
                    .ok_or(MarkupError::MissingExerciseId)?;
                ctx.take_pending_exercise_metadata();
                ctx.freeze_context(&exercise_id);

                let dir = exercise_dir(assignment_dir, &exercise_id);
                fs::create_dir_all(&dir)?;
                let empty_submission = dir.join("empty_submission.py");
                fs::write(&empty_submission, &transformed.prompt)?;
                manifest.files.push(empty_submission);

                let empty_source = dir.join("empty_source.py");
                fs::write(
                    &empty_source,
                    ag_notebook::wrap_as_source_assignment(&transformed.prompt),
                )?;
                manifest.files.push(empty_source);
            }
            CodeCellKind::StudentTest { .. } => {}
            CodeCellKind::InlineTest { name } => {
                let exercise_id = ctx
                    .current_exercise_id
                    .clone()
                    .ok_or(MarkupError::MissingExerciseId)?;
                let dir = exercise_dir(assignment_dir, &exercise_id);
                fs::create_dir_all(&dir)?;

                let context_text = ctx.context_for(&exercise_id);
                let context_path = dir.join(format!("{name}_context.py"));
                fs::write(&context_path, context_text)?;
                manifest.files.push(context_path);

                let inline_body = magic::strip_first_line(&cell.source);
                let inline_path = dir.join(format!("{name}_inline.py"));
                fs::write(&inline_path, inline_body)?;
                manifest.files.push(inline_path);
            }
            CodeCellKind::Template { name } => {
                let exercise_id = ctx
                    .current_exercise_id
                    .clone()
                    .ok_or(MarkupError::MissingExerciseId)?;
                let dir = exercise_dir(assignment_dir, &exercise_id);
                fs::create_dir_all(&dir)?;
                let body = magic::strip_first_line(&cell.source);
                let script = crate::template::wrap_report_template(&body);
                let path = dir.join(format!("{name}.py"));
                fs::write(&path, script)?;
                manifest.files.push(path);
            }
            CodeCellKind::Plain => {
                ctx.push_context_line(&cell.source);
                write_unittest_blocks(&cell.source, ctx, assignment_dir, manifest)?;
            }
        }
        Ok(())
    }
}

fn write_unittest_blocks(
    source: &str,
    ctx: &WalkContext,
    assignment_dir: &Path,
    manifest: &mut AutograderManifest,
) -> Result<(), MarkupError> {
    let blocks = unittest::extract_unittest_blocks(source)?;
    if blocks.is_empty() {
        return Ok(());
    }
    let exercise_id = ctx
        .current_exercise_id
        .clone()
        .ok_or(MarkupError::MissingExerciseId)?;
    let dir = exercise_dir(assignment_dir, &exercise_id);
    fs::create_dir_all(&dir)?;
    for block in blocks {
        let path = dir.join(format!("{}.py", block.class_name));
        fs::write(&path, block.file_contents)?;
        manifest.files.push(path);
    }
    Ok(())
}

fn exercise_dir(assignment_dir: &Path, exercise_id: &str) -> PathBuf {
    assignment_dir.join(exercise_id)
}

/// Strips `# BEGIN UNITTEST` / `# END UNITTEST` spans (inclusive of the
/// markers) from student-facing source, satisfying the invariant that a
/// student notebook never carries that token (spec.md §8).
fn strip_unittest_blocks(source: &str) -> String {
    const BEGIN: &str = "# BEGIN UNITTEST";
    const END: &str = "# END UNITTEST";
    let lines: Vec<&str> = source.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim() == BEGIN {
            match lines[i + 1..].iter().position(|l| l.trim() == END) {
                Some(offset) => {
                    i = i + 1 + offset + 1;
                    continue;
                }
                None => {
                    i += 1;
                    continue;
                }
            }
        }
        out.push(lines[i]);
        i += 1;
    }
    out.join("\n")
}

/// Files written while emitting an autograder asset tree.
#[derive(Debug, Default)]
pub struct AutograderManifest {
    pub files: Vec<PathBuf>,
}

/// The running state of the single-pass walk (spec.md §9: "a small state
/// machine (current assignment id, current exercise id, current context
/// accumulator)").
#[derive(Default)]
struct WalkContext {
    assignment_metadata: Map<String, Value>,
    global_context: Vec<String>,
    exercise_context: Vec<String>,
    collecting_context: bool,
    current_exercise_id: Option<String>,
    pending_exercise_metadata: Option<Map<String, Value>>,
    frozen_context: HashMap<String, String>,
}

impl WalkContext {
    fn start_exercise(&mut self, mapping: Map<String, Value>) {
        self.current_exercise_id = mapping
            .get("exercise_id")
            .and_then(Value::as_str)
            .map(String::from);
        self.exercise_context.clear();
        self.collecting_context = true;
        self.pending_exercise_metadata = Some(mapping);
    }

    fn take_pending_exercise_metadata(&mut self) -> Option<Map<String, Value>> {
        self.pending_exercise_metadata.take()
    }

    fn push_context_line(&mut self, source: &str) {
        if self.current_exercise_id.is_none() {
            self.global_context.push(source.to_string());
        } else if self.collecting_context {
            self.exercise_context.push(source.to_string());
        }
    }

    /// Freezes `global_context + exercise_context` as the context for
    /// `exercise_id`, the point at which that exercise's solution cell is
    /// reached (spec.md §4.2 "exercise context").
    fn freeze_context(&mut self, exercise_id: &str) {
        let mut combined = self.global_context.clone();
        combined.extend(self.exercise_context.clone());
        self.frozen_context
            .insert(exercise_id.to_string(), combined.join("\n\n"));
        self.collecting_context = false;
    }

    fn context_for(&self, exercise_id: &str) -> String {
        self.frozen_context
            .get(exercise_id)
            .cloned()
            .unwrap_or_else(|| {
                let mut combined = self.global_context.clone();
                combined.extend(self.exercise_context.clone());
                combined.join("\n\n")
            })
    }
}
