use crate::ts::errors::TreeSitterError;
use crate::ts::tree::ParseTree;
use ast_grep_language::{LanguageExt, SupportLang};
use std::path::Path;
use tree_sitter::Parser;

/// Pick the grammar for a file from its extension.
pub fn language_for_path(path: &Path) -> Option<SupportLang> {
    let ext = path.extension()?.to_str()?;
    let lang = match ext {
        "rs" => SupportLang::Rust,
        "ts" | "mts" | "cts" => SupportLang::TypeScript,
        "tsx" => SupportLang::Tsx,
        "js" | "mjs" | "cjs" | "jsx" => SupportLang::JavaScript,
        "py" | "pyi" => SupportLang::Python,
        "go" => SupportLang::Go,
        "java" => SupportLang::Java,
        "c" | "h" => SupportLang::C,
        "cc" | "cpp" | "cxx" | "hpp" => SupportLang::Cpp,
        _ => return None,
    };
    Some(lang)
}

/// Tree-sitter parser bound to one of the bundled grammars.
pub struct LanguageParser {
    parser: Parser,
    language: SupportLang,
}

impl LanguageParser {
    /// Create a parser for `language`.
    pub fn new(language: SupportLang) -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let ts_lang = language.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet {
                language: format!("{language:?}"),
            })?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> SupportLang {
        self.language
    }

    /// Parse the full text into an arena tree. There is no incremental mode:
    /// every call starts from scratch.
    pub fn parse(&mut self, text: &str) -> Result<ParseTree, TreeSitterError> {
        let tree = self
            .parser
            .parse(text, None)
            .ok_or_else(|| TreeSitterError::ParseFailed {
                language: format!("{:?}", self.language),
            })?;
        Ok(ParseTree::build(self.language, text.to_string(), tree))
    }
}
