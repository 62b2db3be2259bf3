use ast_grep_language::SupportLang;
use serde::Deserialize;
use std::fmt;

/// Settings shared by every source file of a project.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ProjectSettings {
    /// Grammar for files whose extension does not identify one.
    #[serde(default)]
    pub language: Option<LanguageName>,
    #[serde(default)]
    pub manipulation: ManipulationSettings,
}

impl ProjectSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        if self.manipulation.forgotten_text_len == 0 {
            issues.push(ValidationIssue::Zero {
                field: "manipulation.forgotten_text_len",
            });
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// Text-shape settings used when building inserted text.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ManipulationSettings {
    pub indentation: IndentationText,
    pub newline: NewLineKind,
    pub quote_kind: QuoteKind,
    /// Characters of node text kept for "removed node" diagnostics.
    pub forgotten_text_len: usize,
}

impl Default for ManipulationSettings {
    fn default() -> Self {
        Self {
            indentation: IndentationText::TwoSpaces,
            newline: NewLineKind::Lf,
            quote_kind: QuoteKind::Double,
            forgotten_text_len: 40,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndentationText {
    Tab,
    TwoSpaces,
    FourSpaces,
    EightSpaces,
}

impl IndentationText {
    pub fn as_str(self) -> &'static str {
        match self {
            IndentationText::Tab => "\t",
            IndentationText::TwoSpaces => "  ",
            IndentationText::FourSpaces => "    ",
            IndentationText::EightSpaces => "        ",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewLineKind {
    Lf,
    CrLf,
}

impl NewLineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NewLineKind::Lf => "\n",
            NewLineKind::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    Single,
    Double,
}

impl QuoteKind {
    pub fn as_char(self) -> char {
        match self {
            QuoteKind::Single => '\'',
            QuoteKind::Double => '"',
        }
    }
}

/// Grammar names accepted in settings files.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LanguageName {
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
}

impl LanguageName {
    pub fn support_lang(self) -> SupportLang {
        match self {
            LanguageName::Rust => SupportLang::Rust,
            LanguageName::TypeScript => SupportLang::TypeScript,
            LanguageName::Tsx => SupportLang::Tsx,
            LanguageName::JavaScript => SupportLang::JavaScript,
            LanguageName::Python => SupportLang::Python,
            LanguageName::Go => SupportLang::Go,
            LanguageName::Java => SupportLang::Java,
            LanguageName::C => SupportLang::C,
            LanguageName::Cpp => SupportLang::Cpp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Zero { field: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Zero { field } => write!(f, "{field} must be greater than zero"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}
