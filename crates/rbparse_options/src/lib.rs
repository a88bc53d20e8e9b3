//! rbparse_options: JSON parser options files.
//!
//! An options file carries the same settings as `ParserConfiguration`, in
//! camelCase keys, so a project can pin how its sources are parsed.

use rbparse_parser::ParserConfiguration;
use rbparse_scope::DynamicScope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parser options, matching the options file schema. Absent keys keep the
/// configuration defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParserOptions {
    /// 1-based number of the first source line.
    pub line_number: Option<u32>,
    pub inline_source: Option<bool>,
    pub eval_parse: Option<bool>,
    pub extra_position_information: Option<bool>,
    pub recover_errors: Option<bool>,
    pub verbose: Option<bool>,
    /// Local variables already defined, as for an `eval` binding.
    pub local_variables: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("cannot read options file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("lineNumber must be at least 1")]
    LineNumber,
    #[error("`{0}` is not a local variable name")]
    LocalName(String),
    #[error("local variable `{0}` listed twice")]
    DuplicateLocal(String),
}

impl ParserOptions {
    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.line_number == Some(0) {
            return Err(OptionsError::LineNumber);
        }
        let names = self.local_variables.as_deref().unwrap_or_default();
        for (i, name) in names.iter().enumerate() {
            if !is_local_name(name) {
                return Err(OptionsError::LocalName(name.clone()));
            }
            if names[..i].contains(name) {
                return Err(OptionsError::DuplicateLocal(name.clone()));
            }
        }
        Ok(())
    }

    pub fn to_configuration(&self) -> ParserConfiguration {
        let existing_scope = self
            .local_variables
            .as_ref()
            .map(|names| DynamicScope::new_local(names.iter().map(String::as_str)));
        let eval = self.eval_parse.unwrap_or(existing_scope.is_some());
        ParserConfiguration::new()
            .with_line_number(self.line_number.map_or(0, |line| line.saturating_sub(1)))
            .with_inline_source(self.inline_source.unwrap_or(false))
            .with_eval_parse(eval)
            .with_extra_position_information(self.extra_position_information.unwrap_or(false))
            .with_recover_errors(self.recover_errors.unwrap_or(false))
            .with_verbose(self.verbose.unwrap_or(false))
            .with_existing_scope(existing_scope)
    }
}

/// Identifier-shaped, starting with a lowercase letter or underscore.
fn is_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_lowercase() || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric() || !c.is_ascii())
}

/// Parse options from JSON text.
pub fn parse_options(content: &str) -> Result<ParserOptions, serde_json::Error> {
    serde_json::from_str(content)
}

/// Read and validate an options file.
pub fn load_options(path: impl AsRef<Path>) -> Result<ParserOptions, OptionsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = parse_options(&content).map_err(|source| OptionsError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    options.validate()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_keys() {
        let options = parse_options(r#"{ "lineNumber": 10, "extraPositionInformation": true }"#).unwrap();
        assert_eq!(options.line_number, Some(10));
        assert_eq!(options.extra_position_information, Some(true));
        assert_eq!(options.verbose, None);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(parse_options(r#"{ "lineNo": 3 }"#).is_err());
    }

    #[test]
    fn test_to_configuration_defaults() {
        let config = ParserOptions::default().to_configuration();
        assert_eq!(config.line_number, 0);
        assert!(!config.eval_parse);
        assert!(config.existing_scope.is_none());
    }

    #[test]
    fn test_local_variables_seed_an_eval_scope() {
        let options = parse_options(r#"{ "lineNumber": 3, "localVariables": ["a", "_b"] }"#).unwrap();
        options.validate().unwrap();
        let config = options.to_configuration();
        assert_eq!(config.line_number, 2);
        assert!(config.eval_parse);
        let scope = config.existing_scope.unwrap();
        assert_eq!(scope.names(), ["a".to_string(), "_b".to_string()]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let options = parse_options(r#"{ "lineNumber": 0 }"#).unwrap();
        assert!(matches!(options.validate(), Err(OptionsError::LineNumber)));

        let options = parse_options(r#"{ "localVariables": ["Const"] }"#).unwrap();
        assert!(matches!(options.validate(), Err(OptionsError::LocalName(name)) if name == "Const"));

        let options = parse_options(r#"{ "localVariables": ["a", "a"] }"#).unwrap();
        assert!(matches!(options.validate(), Err(OptionsError::DuplicateLocal(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_options("/nonexistent/rbparse.json").unwrap_err();
        assert!(matches!(err, OptionsError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/rbparse.json"));
    }
}
