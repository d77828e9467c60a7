use std::collections::BTreeSet;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Indentation-aware writer for generated C# sources.
#[derive(Clone, Debug, Default)]
pub struct SourceWriter {
    buffer: String,
    depth: usize,
}

impl SourceWriter {
    /// Starts a new generated file with the standard header and given `using` directives.
    pub fn with_header(usings: &BTreeSet<String>) -> Result<Self, std::fmt::Error> {
        let mut writer = Self::default();
        writer.line("// <auto-generated/>")?;
        writer.line("#nullable enable")?;

        if !usings.is_empty() {
            writer.blank();
            for namespace in usings {
                writer.line(format_args!("using {namespace};"))?;
            }
        }

        writer.blank();
        Ok(writer)
    }

    pub fn line(&mut self, text: impl std::fmt::Display) -> Result<(), std::fmt::Error> {
        for _ in 0..self.depth {
            self.buffer.push_str(INDENT);
        }

        writeln!(self.buffer, "{text}")
    }

    /// Writes an empty line. Consecutive blank lines collapse into one.
    pub fn blank(&mut self) {
        if !self.buffer.ends_with("\n\n") {
            self.buffer.push('\n');
        }
    }

    /// Writes a header line and opens a brace block.
    pub fn open(&mut self, header: impl std::fmt::Display) -> Result<(), std::fmt::Error> {
        self.line(header)?;
        self.line("{")?;
        self.depth += 1;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), std::fmt::Error> {
        self.depth = self.depth.saturating_sub(1);
        self.line("}")
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}
