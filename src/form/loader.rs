//! Form definition loader
//!
//! - One JSON document per form
//! - Malformed documents are FATAL for the form session

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{FormError, FormResult};
use super::types::FormDefinition;
use crate::observability::{Event, Logger};

/// Reads and structurally validates form definitions.
pub struct FormLoader {
    /// Directory relative paths are resolved against
    base_dir: PathBuf,
}

impl FormLoader {
    /// Creates a loader resolving relative paths against `base_dir`.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// Loads a definition file.
    pub fn load(&self, path: &Path) -> FormResult<FormDefinition> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        let content = fs::read_to_string(&full).map_err(|e| {
            FormError::invalid_definition(
                full.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let definition = Self::parse(&content, &full.display().to_string())?;

        let field_count = definition.fields.len().to_string();
        Logger::info(
            Event::FormLoaded,
            &[("path", &full.display().to_string()), ("fields", &field_count)],
        );

        Ok(definition)
    }

    /// Parses a definition from a string. `source` names it in errors.
    pub fn parse(content: &str, source: &str) -> FormResult<FormDefinition> {
        let definition: FormDefinition = serde_json::from_str(content)
            .map_err(|e| FormError::invalid_definition(source, format!("Invalid JSON: {}", e)))?;

        definition
            .validate_structure()
            .map_err(|e| FormError::invalid_definition(source, e))?;

        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::errors::FormErrorCode;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{"fields": [{"id": "Name"}]}"#;

    #[test]
    fn test_parse_minimal() {
        let def = FormLoader::parse(MINIMAL, "<test>").unwrap();
        assert_eq!(def.fields.len(), 1);
        assert!(def.groups.is_empty());
        assert!(def.presets.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        let err = FormLoader::parse("{fields: ", "<test>").err().unwrap();
        assert_eq!(err.code(), FormErrorCode::FormInvalidDefinition);
        assert!(err.message().contains("<test>"));
    }

    #[test]
    fn test_parse_rejects_bad_engine_section() {
        let err = FormLoader::parse(
            r#"{"engine": {"log_level": "loud"}, "fields": [{"id": "a"}]}"#,
            "<test>",
        )
        .err()
        .unwrap();
        assert!(err.message().contains("loud"));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let loader = FormLoader::new(tmp.path());
        assert!(loader.load(Path::new("fehlt.json")).is_err());
    }
}
