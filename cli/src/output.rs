//! Output utilities for CLI tools.

use std::{fs::File, io::Write};

use serde::Serialize;

/// Structured output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

/// Output configuration.
pub struct Output {
    pub format: DisplayFormat,
    pub file: Option<String>,
}

impl Output {
    /// Creates a new output configuration.
    pub fn new(format: DisplayFormat, file: Option<String>) -> Self {
        Self { format, file }
    }

    /// Renders `value` in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            DisplayFormat::Yaml => serde_yaml::to_string(value)?,
            DisplayFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }

    /// Outputs the result to the configured file, or stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let output = self.render(value)?;

        match &self.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                println!("{}", output.trim_end());
            }
        }

        Ok(())
    }
}

/// Prints verbose output if enabled.
pub fn print_verbose(enabled: bool, message: &str) {
    if enabled {
        eprintln!("[verbose] {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_formats() {
        let value: BTreeMap<&str, u32> = [("units", 2)].into_iter().collect();

        let yaml = Output::new(DisplayFormat::Yaml, None).render(&value).unwrap();
        assert_eq!(yaml.trim(), "units: 2");

        let json = Output::new(DisplayFormat::Json, None).render(&value).unwrap();
        assert_eq!(json, "{\n  \"units\": 2\n}");
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let output = Output::new(DisplayFormat::Json, Some(path.to_string_lossy().to_string()));
        output.write(&vec![1, 2]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[\n  1,\n  2\n]");
    }
}
