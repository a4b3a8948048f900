//! Command-line interface module
//!
//! This module contains the implementations for the CLI subcommands.

pub mod unminify;

/// Common CLI utilities
pub mod utils {
    use std::path::Path;

    use oxc_span::SourceType;

    use crate::error::{Error as UnminifyError, Result as UnminifyResult};

    /// Read a source file into a string
    pub fn read_source(path: &Path) -> UnminifyResult<String> {
        std::fs::read_to_string(path)
            .map_err(|e| UnminifyError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Source type from the file extension
    pub fn source_type(path: &Path) -> UnminifyResult<SourceType> {
        SourceType::from_path(path).map_err(|_| UnminifyError::SourceType {
            path: path.display().to_string(),
        })
    }

    /// Write output to file or stdout
    pub fn write_output(content: &str, output_path: Option<&Path>) -> UnminifyResult<()> {
        match output_path {
            Some(path) => std::fs::write(path, content)
                .map_err(|e| UnminifyError::Io(format!("{}: {}", path.display(), e))),
            None => {
                print!("{}", content);
                Ok(())
            }
        }
    }
}
