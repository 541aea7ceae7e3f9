//! CLI output formatting module

use crate::config::{supports_color, OutputFormat};
use sdpm_core::{Result, SemanticChunk};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Chunks produced for one input document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkReport {
    /// Path of the source document
    pub source: String,
    pub chunk_count: usize,
    pub total_tokens: usize,
    pub chunks: Vec<SemanticChunk>,
}

impl ChunkReport {
    pub fn new<S: Into<String>>(source: S, chunks: Vec<SemanticChunk>) -> Self {
        Self {
            source: source.into(),
            chunk_count: chunks.len(),
            total_tokens: chunks.iter().map(|c| c.token_count).sum(),
            chunks,
        }
    }
}

/// Output formatter for CLI results
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
    writer: Box<dyn Write + Send>,
}

impl OutputFormatter {
    /// Create a formatter with specific format
    pub fn with_format(format: OutputFormat, use_colors: bool) -> Self {
        Self {
            format,
            use_colors: use_colors && supports_color(),
            writer: Box::new(io::stdout()),
        }
    }

    /// Create a formatter with custom writer
    pub fn with_writer<W: Write + Send + 'static>(
        format: OutputFormat,
        use_colors: bool,
        writer: W,
    ) -> Self {
        Self {
            format,
            use_colors: use_colors && supports_color(),
            writer: Box::new(writer),
        }
    }

    /// Format and output a serializable value
    pub fn output<T: Serialize>(&mut self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.output_json(value),
            OutputFormat::Yaml => self.output_yaml(value),
            OutputFormat::Text => self.output_text(value),
        }
    }

    /// Output a chunk report; text format lists each chunk
    pub fn report(&mut self, report: &ChunkReport) -> Result<()> {
        if self.format != OutputFormat::Text {
            return self.output(report);
        }

        writeln!(
            self.writer,
            "{} ({} chunks, {} tokens)",
            self.colorize_key(&report.source),
            report.chunk_count,
            report.total_tokens
        )?;

        for chunk in &report.chunks {
            writeln!(
                self.writer,
                "--- chunk {}/{} [bytes {}..{}] {} sentences, {} tokens, similarity {:.3}",
                chunk.chunk_index + 1,
                chunk.total_chunks,
                chunk.start_index,
                chunk.end_index,
                chunk.sentence_count(),
                chunk.token_count,
                chunk.avg_similarity
            )?;
            writeln!(self.writer, "{}", chunk.text.trim_end())?;
        }
        Ok(())
    }

    /// Output JSON format
    fn output_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Output YAML format
    fn output_yaml<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let yaml = serde_yaml::to_string(value)?;
        writeln!(self.writer, "{}", yaml)?;
        Ok(())
    }

    /// Output text format (human-readable)
    fn output_text<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json_value: serde_json::Value = serde_json::to_value(value)?;
        self.format_json_pretty(&json_value, 0)?;
        Ok(())
    }

    /// Format JSON value in a pretty, human-readable way
    fn format_json_pretty(&mut self, value: &serde_json::Value, indent: usize) -> Result<()> {
        let indent_str = "  ".repeat(indent);

        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map {
                    match val {
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            writeln!(self.writer, "{}{}:", indent_str, self.colorize_key(key))?;
                            self.format_json_pretty(val, indent + 1)?;
                        }
                        _ => {
                            writeln!(
                                self.writer,
                                "{}{}: {}",
                                indent_str,
                                self.colorize_key(key),
                                self.format_value(val)
                            )?;
                        }
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    writeln!(self.writer, "{}[{}]:", indent_str, i)?;
                    self.format_json_pretty(item, indent + 1)?;
                }
            }
            _ => {
                writeln!(self.writer, "{}{}", indent_str, self.format_value(value))?;
            }
        }
        Ok(())
    }

    /// Format a single value with appropriate styling
    fn format_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => {
                if self.use_colors {
                    format!("\x1b[32m\"{}\"\x1b[0m", s)
                } else {
                    format!("\"{}\"", s)
                }
            }
            serde_json::Value::Number(n) => {
                if self.use_colors {
                    format!("\x1b[36m{}\x1b[0m", n)
                } else {
                    n.to_string()
                }
            }
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => "null".to_string(),
            serde_json::Value::Array(arr) => format!("[{} items]", arr.len()),
            serde_json::Value::Object(obj) => format!("{{{}}} keys", obj.len()),
        }
    }

    /// Colorize a key name
    fn colorize_key(&self, key: &str) -> String {
        if self.use_colors {
            format!("\x1b[34m{}\x1b[0m", key) // Blue for keys
        } else {
            key.to_string()
        }
    }

    /// Output a simple message
    pub fn message(&mut self, msg: &str) -> Result<()> {
        writeln!(self.writer, "{}", msg)?;
        Ok(())
    }

    /// Output a success message
    pub fn success(&mut self, msg: &str) -> Result<()> {
        if self.use_colors {
            writeln!(self.writer, "\x1b[32m✓\x1b[0m {}", msg)?;
        } else {
            writeln!(self.writer, "✓ {}", msg)?;
        }
        Ok(())
    }

    /// Output an error message
    pub fn error(&mut self, msg: &str) -> Result<()> {
        if self.use_colors {
            writeln!(self.writer, "\x1b[31m✗\x1b[0m {}", msg)?;
        } else {
            writeln!(self.writer, "✗ {}", msg)?;
        }
        Ok(())
    }

    /// Output a warning message
    pub fn warning(&mut self, msg: &str) -> Result<()> {
        if self.use_colors {
            writeln!(self.writer, "\x1b[33m⚠\x1b[0m {}", msg)?;
        } else {
            writeln!(self.writer, "⚠ {}", msg)?;
        }
        Ok(())
    }
}
