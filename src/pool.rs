//! Thread-local parser pooling.
//!
//! Every commit reparses a whole file, so parsers are kept per thread and per
//! grammar instead of being rebuilt for each edit.

use crate::ts::{LanguageParser, TreeSitterError};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<String, LanguageParser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with the pooled parser for `language`, creating it on first use.
pub fn with_parser<F, R>(language: SupportLang, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut LanguageParser) -> R,
{
    let key = format!("{language:?}");
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(key) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(LanguageParser::new(language)?)
            }
        };
        Ok(f(parser))
    })
}
