//! Graph readers, layout writers and format dispatch
//!
//! Graphs are read from JSON or YAML documents listing body and spring
//! registrations. Layouts are written as JSON, YAML or CSV. Readers and
//! writers are looked up by file extension through a [`FormatRegistry`].

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LayoutError;
use crate::model::{BodyId, BodySpec, SpringSpec};
use crate::simulation::{Convergence, Simulation};

/// Errors that can occur during reading or writing
#[derive(Error, Debug)]
pub enum IoError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),

    /// A serialization error occurred
    #[error("write error: {0}")]
    Write(String),

    /// The document was read but describes an invalid graph or configuration
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Result type for reader/writer operations
pub type IoResult<T> = Result<T, IoError>;

/// Bodies and springs to register, as found in a graph file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub bodies: Vec<BodySpec>,
    #[serde(default)]
    pub springs: Vec<SpringSpec>,
}

impl GraphDocument {
    /// Read a graph file, picking the reader from its extension
    pub fn load(path: &Path) -> IoResult<Self> {
        let registry = FormatRegistry::with_defaults();
        let reader = registry.reader_for_path(path)?;
        let graph = reader.read(path)?;
        tracing::debug!(
            path = %path.display(),
            bodies = graph.bodies.len(),
            springs = graph.springs.len(),
            "loaded graph"
        );
        Ok(graph)
    }

    /// Register every body and spring of the document, stopping at the first
    /// invalid registration
    pub fn populate(&self, simulation: &mut Simulation) -> crate::error::Result<()> {
        for body in &self.bodies {
            simulation.upsert_body(body.clone())?;
        }
        for spring in &self.springs {
            simulation.upsert_spring(spring.clone())?;
        }
        Ok(())
    }
}

/// Final position of one body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub id: BodyId,
    pub x: f64,
    pub y: f64,
}

/// Result of a driven layout run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub ticks: usize,
    pub energy: f64,
    pub settled: bool,
    /// Ordered by body id
    pub positions: Vec<PositionRecord>,
}

impl LayoutDocument {
    pub fn new(simulation: &Simulation, report: Convergence) -> Self {
        let positions = simulation
            .positions()
            .into_iter()
            .map(|(id, point)| PositionRecord {
                id,
                x: point.x,
                y: point.y,
            })
            .collect();
        Self {
            ticks: report.ticks,
            energy: report.energy,
            settled: report.settled,
            positions,
        }
    }
}

/// A reader parses a graph document from one input format
pub trait Reader {
    /// Parse document text
    fn parse(&self, content: &str) -> IoResult<GraphDocument>;

    /// File extensions this reader can handle (e.g., ["yaml", "yml"])
    fn supported_extensions(&self) -> &[&str];

    /// Read and parse the file at `input`
    fn read(&self, input: &Path) -> IoResult<GraphDocument> {
        let content = std::fs::read_to_string(input)?;
        self.parse(&content)
    }

    /// Check if this reader can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A writer renders a layout document in one output format
pub trait Writer {
    /// Render the layout as text
    fn render(&self, layout: &LayoutDocument) -> IoResult<String>;

    /// Identifier for this output format, also its file extension
    fn format_id(&self) -> &str;

    /// Render the layout into the file at `output`
    fn write(&self, layout: &LayoutDocument, output: &Path) -> IoResult<()> {
        std::fs::write(output, self.render(layout)?)?;
        Ok(())
    }
}

pub struct JsonReader;

impl Reader for JsonReader {
    fn parse(&self, content: &str) -> IoResult<GraphDocument> {
        serde_json::from_str(content).map_err(|e| IoError::Parse(e.to_string()))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

pub struct YamlReader;

impl Reader for YamlReader {
    fn parse(&self, content: &str) -> IoResult<GraphDocument> {
        serde_yaml::from_str(content).map_err(|e| IoError::Parse(e.to_string()))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

pub struct JsonWriter;

impl Writer for JsonWriter {
    fn render(&self, layout: &LayoutDocument) -> IoResult<String> {
        let mut json =
            serde_json::to_string_pretty(layout).map_err(|e| IoError::Write(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }

    fn format_id(&self) -> &str {
        "json"
    }
}

pub struct YamlWriter;

impl Writer for YamlWriter {
    fn render(&self, layout: &LayoutDocument) -> IoResult<String> {
        serde_yaml::to_string(layout).map_err(|e| IoError::Write(e.to_string()))
    }

    fn format_id(&self) -> &str {
        "yaml"
    }
}

/// Positions only, one `id,x,y` row per body
pub struct CsvWriter;

impl Writer for CsvWriter {
    fn render(&self, layout: &LayoutDocument) -> IoResult<String> {
        let mut csv = String::from("id,x,y\n");
        for record in &layout.positions {
            writeln!(csv, "{},{},{}", csv_field(record.id.as_str()), record.x, record.y)
                .map_err(|e| IoError::Write(e.to_string()))?;
        }
        Ok(csv)
    }

    fn format_id(&self) -> &str {
        "csv"
    }
}

/// Quote a field when it holds a separator, a quote or a line break
fn csv_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

/// Registry of available readers and writers
pub struct FormatRegistry {
    readers: Vec<Box<dyn Reader>>,
    writers: Vec<Box<dyn Writer>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Create a registry with all default readers and writers registered
    ///
    /// Currently registers:
    /// - Readers: `JsonReader` (json), `YamlReader` (yaml, yml)
    /// - Writers: `JsonWriter` (json), `YamlWriter` (yaml), `CsvWriter` (csv)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_reader(Box::new(JsonReader));
        registry.register_reader(Box::new(YamlReader));
        registry.register_writer(Box::new(JsonWriter));
        registry.register_writer(Box::new(YamlWriter));
        registry.register_writer(Box::new(CsvWriter));
        registry
    }

    /// Register a reader
    pub fn register_reader(&mut self, reader: Box<dyn Reader>) {
        self.readers.push(reader);
    }

    /// Register a writer
    pub fn register_writer(&mut self, writer: Box<dyn Writer>) {
        self.writers.push(writer);
    }

    /// Find a reader for the given file extension
    pub fn reader_for_extension(&self, ext: &str) -> Option<&dyn Reader> {
        self.readers
            .iter()
            .find(|r| r.supports_extension(ext))
            .map(|r| r.as_ref())
    }

    /// Find a writer by format ID
    pub fn writer_for_format(&self, format_id: &str) -> Option<&dyn Writer> {
        let format_id = if format_id.eq_ignore_ascii_case("yml") {
            "yaml"
        } else {
            format_id
        };
        self.writers
            .iter()
            .find(|w| w.format_id().eq_ignore_ascii_case(format_id))
            .map(|w| w.as_ref())
    }

    /// Get file extension from a path
    pub fn extension_from_path(path: &Path) -> Option<&str> {
        path.extension().and_then(|e| e.to_str())
    }

    /// Find a reader for the given path based on its extension
    pub fn reader_for_path(&self, path: &Path) -> IoResult<&dyn Reader> {
        let ext = Self::extension_from_path(path)
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;

        self.reader_for_extension(ext)
            .ok_or_else(|| IoError::UnsupportedFormat(ext.to_string()))
    }

    /// Find a writer for the given path based on its extension
    pub fn writer_for_path(&self, path: &Path) -> IoResult<&dyn Writer> {
        let ext = Self::extension_from_path(path)
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;

        self.writer_for_format(ext)
            .ok_or_else(|| IoError::UnsupportedFormat(ext.to_string()))
    }
}
