use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The splice primitive every commit compiles down to: replace the bytes in
/// `[start, end)` of a source text with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "TextEdit does nothing until applied"]
pub struct TextEdit {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
    pub new_text: String,
    /// What the span must currently contain, if checked
    pub expected_before: Option<EditVerification>,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("before-text verification failed at {start}..{end}: found {found:?}")]
    BeforeTextMismatch {
        start: usize,
        end: usize,
        found: String,
    },

    #[error("invalid byte range: [{start}, {end}) in text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("edits overlap at byte {at}")]
    Overlap { at: usize },

    #[error("byte offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

impl TextEdit {
    pub fn new(start: usize, end: usize, new_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            new_text: new_text.into(),
            expected_before: None,
        }
    }

    pub fn insert(pos: usize, new_text: impl Into<String>) -> Self {
        Self::new(pos, pos, new_text)
    }

    /// Edit that refuses to apply unless the span still holds `expected_before`.
    pub fn verified(
        start: usize,
        end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            expected_before: Some(EditVerification::from_text(expected_before)),
            ..Self::new(start, end, new_text)
        }
    }

    /// Length change this edit causes.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - (self.end - self.start) as isize
    }

    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    fn validate(&self, text: &str) -> Result<(), EditError> {
        if self.start > self.end || self.end > text.len() {
            return Err(EditError::InvalidRange {
                start: self.start,
                end: self.end,
                len: text.len(),
            });
        }
        for offset in [self.start, self.end] {
            if !text.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
        if let Some(expected) = &self.expected_before {
            let current = &text[self.start..self.end];
            if !expected.matches(current) {
                return Err(EditError::BeforeTextMismatch {
                    start: self.start,
                    end: self.end,
                    found: current.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Produce the spliced text.
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        self.validate(text)?;
        let mut out = String::with_capacity(text.len() + self.new_text.len());
        out.push_str(&text[..self.start]);
        out.push_str(&self.new_text);
        out.push_str(&text[self.end..]);
        Ok(out)
    }

    /// Apply several non-overlapping edits to the same text in one pass.
    ///
    /// All edits are validated against the original text; splicing then runs
    /// bottom-to-top so earlier offsets stay valid.
    pub fn apply_batch(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
        let mut sorted: Vec<&TextEdit> = edits.iter().collect();
        sorted.sort_by_key(|e| (e.start, e.end));

        for edit in &sorted {
            edit.validate(text)?;
        }
        for pair in sorted.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let both_inserts_here =
                first.is_insertion() && second.is_insertion() && first.start == second.start;
            if first.end > second.start || both_inserts_here {
                return Err(EditError::Overlap { at: second.start });
            }
        }

        let mut out = text.to_string();
        for edit in sorted.iter().rev() {
            out.replace_range(edit.start..edit.end, &edit.new_text);
        }
        Ok(out)
    }
}
