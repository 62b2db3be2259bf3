use crate::config::schema::{ProjectSettings, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read settings from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(f, "failed to parse settings TOML ({}): {}", path.display(), source),
                None => write!(f, "failed to parse settings TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid settings ({}): {}", path.display(), source),
                None => write!(f, "invalid settings: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<ProjectSettings, ConfigError> {
    let settings: ProjectSettings = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    settings
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(settings)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ProjectSettings, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{IndentationText, LanguageName, NewLineKind, QuoteKind};

    #[test]
    fn empty_input_uses_defaults() {
        let settings = load_from_str("").unwrap();
        assert_eq!(settings, ProjectSettings::default());
        assert_eq!(settings.manipulation.indentation, IndentationText::TwoSpaces);
        assert_eq!(settings.manipulation.forgotten_text_len, 40);
    }

    #[test]
    fn full_settings_parse() {
        let settings = load_from_str(
            r#"
language = "typescript"

[manipulation]
indentation = "four_spaces"
newline = "cr_lf"
quote_kind = "single"
forgotten_text_len = 12
"#,
        )
        .unwrap();

        assert_eq!(settings.language, Some(LanguageName::TypeScript));
        assert_eq!(settings.manipulation.indentation.as_str(), "    ");
        assert_eq!(settings.manipulation.newline, NewLineKind::CrLf);
        assert_eq!(settings.manipulation.quote_kind, QuoteKind::Single);
        assert_eq!(settings.manipulation.forgotten_text_len, 12);
    }

    #[test]
    fn zero_snapshot_length_is_invalid() {
        let err = load_from_str("[manipulation]\nforgotten_text_len = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("forgotten_text_len"));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }
}
