use crate::sg::errors::AstGrepError;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch, Pattern};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHED_PATTERNS: usize = 256;

thread_local! {
    // Keyed by "<lang>:<pattern>" so one pattern string compiled for two
    // grammars never collides.
    static PATTERNS: RefCell<HashMap<String, Pattern>> = RefCell::new(HashMap::new());
}

/// Compiled pattern from the thread-local cache. The cache is cleared when
/// it reaches its cap and refilled on demand.
fn compiled(pattern: &str, lang: SupportLang) -> Pattern {
    let key = format!("{lang:?}:{pattern}");
    PATTERNS.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(p) = cache.get(&key) {
            return p.clone();
        }
        if cache.len() >= MAX_CACHED_PATTERNS {
            cache.clear();
        }
        let compiled = Pattern::new(pattern, lang);
        cache.insert(key, compiled.clone());
        compiled
    })
}

/// A pattern match with captured metavariables.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub byte_start: usize,
    pub byte_end: usize,
    /// Grammar kind of the matched node
    pub kind: String,
    pub text: String,
    /// Captured metavariables: name -> text
    pub captures: HashMap<String, String>,
}

/// Pattern matcher over one version of a source text.
pub struct PatternMatcher {
    source: String,
    lang: SupportLang,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    pub fn new(source: &str, lang: SupportLang) -> Self {
        Self {
            source: source.to_string(),
            lang,
            sg: AstGrep::new(source, lang),
        }
    }

    /// Find all matches for a pattern, in document order.
    pub fn find_all(&self, pattern: &str) -> Vec<PatternMatch> {
        let pat = compiled(pattern, self.lang);
        self.sg
            .root()
            .find_all(&pat)
            .map(|m| self.to_pattern_match(m))
            .collect()
    }

    /// Find exactly one match for a pattern.
    pub fn find_unique(&self, pattern: &str) -> Result<PatternMatch, AstGrepError> {
        let mut matches = self.find_all(pattern);
        match matches.len() {
            0 => Err(AstGrepError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(AstGrepError::AmbiguousMatch { count: n }),
        }
    }

    pub fn has_match(&self, pattern: &str) -> bool {
        let pat = compiled(pattern, self.lang);
        self.sg.root().find(&pat).is_some()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn to_pattern_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let node = m.get_node();
        let range = node.range();
        let kind = node.kind().to_string();
        let env = m.get_env().clone();
        let captures: HashMap<String, String> = env.into();

        PatternMatch {
            byte_start: range.start,
            byte_end: range.end,
            kind,
            text: self.source[range.clone()].to_string(),
            captures,
        }
    }
}
