use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("failed to set language {language} for parser")]
    LanguageSet { language: String },

    #[error("failed to parse {language} source code")]
    ParseFailed { language: String },

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("capture '{name}' not found in query")]
    CaptureNotFound { name: String },
}
