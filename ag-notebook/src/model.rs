use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::NotebookError;

/// Either "code" or "markdown" (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Code,
    Markdown,
}

impl CellType {
    fn as_wire_str(self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Markdown => "markdown",
        }
    }
}

/// One cell of a notebook.
///
/// `source` is always the fully-joined text, never the wire-format's
/// string-or-array-of-lines split (spec.md §4.1). `outputs` only applies to
/// code cells and is kept as an ordered name → text map, the simplified
/// shape this system's reports need rather than the full nbformat output
/// object schema. `extra` carries any per-cell key this model doesn't know
/// about, so round-tripping never drops user authoring information.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub cell_type: CellType,
    pub metadata: Map<String, Value>,
    pub source: String,
    pub outputs: Option<IndexMap<String, String>>,
    pub extra: Map<String, Value>,
}

impl Cell {
    pub fn new_code(source: impl Into<String>) -> Self {
        Cell {
            cell_type: CellType::Code,
            metadata: Map::new(),
            source: source.into(),
            outputs: Some(IndexMap::new()),
            extra: Map::new(),
        }
    }

    pub fn new_markdown(source: impl Into<String>) -> Self {
        Cell {
            cell_type: CellType::Markdown,
            metadata: Map::new(),
            source: source.into(),
            outputs: None,
            extra: Map::new(),
        }
    }

    pub fn exercise_id(&self) -> Option<&str> {
        self.metadata.get("exercise_id").and_then(Value::as_str)
    }

    pub fn is_solution_cell(&self) -> bool {
        self.exercise_id().is_some()
    }
}

/// The in-memory representation of a notebook (spec.md §3).
///
/// Round-tripping `parse(emit(parse(n)))` reproduces `parse(n)` cell for
/// cell in type, metadata, and source (spec.md §8) — any top-level key
/// other than `nbformat`, `nbformat_minor`, `metadata`, `cells` is
/// intentionally not preserved (spec.md §4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    pub nbformat: i64,
    pub nbformat_minor: i64,
    pub metadata: Map<String, Value>,
    pub cells: Vec<Cell>,
}

impl Notebook {
    pub fn new() -> Self {
        Notebook {
            nbformat: 4,
            nbformat_minor: 5,
            metadata: Map::new(),
            cells: Vec::new(),
        }
    }

    pub fn assignment_id(&self) -> Option<&str> {
        self.metadata.get("assignment_id").and_then(Value::as_str)
    }

    /// Parses a notebook from its wire-format JSON bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, NotebookError> {
        let root: Value = serde_json::from_slice(bytes)?;
        Self::from_value(root)
    }

    pub fn from_value(root: Value) -> Result<Self, NotebookError> {
        let nbformat = root.get("nbformat").and_then(Value::as_i64).unwrap_or(4);
        let nbformat_minor = root
            .get("nbformat_minor")
            .and_then(Value::as_i64)
            .unwrap_or(5);
        let metadata = root
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let raw_cells = root
            .get("cells")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut cells = Vec::with_capacity(raw_cells.len());
        for (index, raw_cell) in raw_cells.into_iter().enumerate() {
            cells.push(parse_cell(raw_cell, index)?);
        }

        Ok(Notebook {
            nbformat,
            nbformat_minor,
            metadata,
            cells,
        })
    }

    /// Emits the notebook back to wire-format JSON bytes (pretty-printed).
    pub fn emit(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(&self.to_value()).expect("notebook serializes to valid JSON")
    }

    pub fn to_value(&self) -> Value {
        let cells: Vec<Value> = self.cells.iter().map(emit_cell).collect();
        let mut root = Map::new();
        root.insert("nbformat".into(), Value::from(self.nbformat));
        root.insert("nbformat_minor".into(), Value::from(self.nbformat_minor));
        root.insert("metadata".into(), Value::Object(self.metadata.clone()));
        root.insert("cells".into(), Value::Array(cells));
        Value::Object(root)
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

fn join_source(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let mut buf = String::new();
            for item in items {
                buf.push_str(item.as_str()?);
            }
            Some(buf)
        }
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn parse_cell(mut raw: Value, index: usize) -> Result<Cell, NotebookError> {
    let obj = raw
        .as_object_mut()
        .ok_or(NotebookError::InvalidSource { index })?;

    let cell_type = match obj.remove("cell_type").and_then(|v| v.as_str().map(String::from)) {
        Some(ref s) if s == "markdown" => CellType::Markdown,
        _ => CellType::Code,
    };

    let source_raw = obj.remove("source").unwrap_or(Value::Null);
    let source = join_source(&source_raw).ok_or(NotebookError::InvalidSource { index })?;

    let metadata = match obj.remove("metadata") {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };

    let outputs = if cell_type == CellType::Code {
        let raw_outputs = obj.remove("outputs").and_then(|v| match v {
            Value::Array(items) => Some(items),
            _ => None,
        });
        Some(parse_outputs(raw_outputs.unwrap_or_default()))
    } else {
        None
    };

    // execution_count is re-derived on emit (always null); drop it here so
    // it doesn't leak into `extra`.
    obj.remove("execution_count");

    Ok(Cell {
        cell_type,
        metadata,
        source,
        outputs,
        extra: obj.clone(),
    })
}

fn parse_outputs(raw_outputs: Vec<Value>) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for (i, output) in raw_outputs.into_iter().enumerate() {
        let name = output
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| output.get("output_type").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| format!("output_{i}"));

        let text = output
            .get("text")
            .and_then(|t| join_source(t))
            .unwrap_or_default();

        map.insert(name, text);
    }
    map
}

fn split_lines(source: &str) -> Vec<Value> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<Value> = source
        .split_inclusive('\n')
        .map(|l| Value::String(l.to_string()))
        .collect();
    // `split_inclusive` keeps trailing newlines attached to each line
    // already, matching "trailing newline on every line except possibly
    // the last" (spec.md §4.1).
    if lines.is_empty() {
        lines.push(Value::String(String::new()));
    }
    lines
}

fn emit_cell(cell: &Cell) -> Value {
    let mut obj = cell.extra.clone();
    obj.insert("cell_type".into(), Value::String(cell.cell_type.as_wire_str().into()));
    obj.insert("metadata".into(), Value::Object(cell.metadata.clone()));
    obj.insert("source".into(), Value::Array(split_lines(&cell.source)));

    if cell.cell_type == CellType::Code {
        let outputs = cell
            .outputs
            .as_ref()
            .map(|m| {
                m.iter()
                    .map(|(name, text)| {
                        let mut o = Map::new();
                        o.insert("output_type".into(), Value::String("stream".into()));
                        o.insert("name".into(), Value::String(name.clone()));
                        o.insert("text".into(), Value::Array(split_lines(text)));
                        Value::Object(o)
                    })
                    .collect()
            })
            .unwrap_or_default();
        obj.insert("outputs".into(), Value::Array(outputs));
        obj.insert("execution_count".into(), Value::Null);
    }

    Value::Object(obj)
}
