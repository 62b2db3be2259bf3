//! Rebinding wrappers from an old tree to its reparsed successor.
//!
//! Starting from the two roots, old children are matched to new children in
//! order. A match needs the same kind and the same token span once the old
//! offsets are shifted through the edited regions, and it must be the only
//! such candidate. Nodes without a unique match, and nodes whose tokens
//! overlap an edit, stay unmatched and their wrappers are forgotten.

use crate::edit::TextEdit;
use crate::ts::{NodeIndex, ParseTree};
use std::collections::{HashMap, HashSet};

/// One edited span, in old-text offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) new_len: usize,
}

impl Region {
    fn delta(self) -> isize {
        self.new_len as isize - (self.end - self.start) as isize
    }

    fn is_insertion(self) -> bool {
        self.start == self.end
    }

    /// True if the region touches the token span `[start, end)`. Insertions
    /// only count when strictly inside it.
    fn overlaps(self, start: usize, end: usize) -> bool {
        if self.is_insertion() {
            start < self.start && self.start < end
        } else {
            self.start < end && start < self.end
        }
    }
}

pub(crate) fn regions_of(edits: &[TextEdit]) -> Vec<Region> {
    let mut regions: Vec<Region> = edits
        .iter()
        .map(|e| Region {
            start: e.start,
            end: e.end,
            new_len: e.new_text.len(),
        })
        .collect();
    regions.sort_by_key(|r| (r.start, r.end));
    regions
}

/// Possible new offsets for an old offset: one value normally, two when an
/// insertion sits exactly at it, none when it lies inside a replaced span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mapped {
    Gone,
    At(usize),
    Either(usize, usize),
}

impl Mapped {
    fn accepts(self, offset: usize) -> bool {
        match self {
            Mapped::Gone => false,
            Mapped::At(p) => p == offset,
            Mapped::Either(a, b) => a == offset || b == offset,
        }
    }

    fn highest(self) -> Option<usize> {
        match self {
            Mapped::Gone => None,
            Mapped::At(p) => Some(p),
            Mapped::Either(a, b) => Some(a.max(b)),
        }
    }
}

pub(crate) fn map_offset(regions: &[Region], offset: usize) -> Mapped {
    let mut shift: isize = 0;
    for region in regions {
        if region.is_insertion() {
            if region.start < offset {
                shift += region.delta();
                continue;
            }
            if region.start == offset {
                let before = (offset as isize + shift) as usize;
                return Mapped::Either(before, before + region.new_len);
            }
            break;
        }
        if region.end <= offset {
            shift += region.delta();
            continue;
        }
        if region.start < offset {
            return Mapped::Gone;
        }
        break;
    }
    Mapped::At((offset as isize + shift) as usize)
}

/// Which nodes may be rebound even though an edit touches their tokens.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RebindScope {
    /// The edited parent and its ancestors.
    Ancestors(NodeIndex),
    /// Any node; used by transforms, which forget replaced subtrees first.
    Containing,
}

pub(crate) struct Reconciler<'a> {
    old: &'a ParseTree,
    new: &'a ParseTree,
    regions: &'a [Region],
    scope: RebindScope,
    /// Old nodes that are materialized or have a materialized descendant.
    wanted: HashSet<NodeIndex>,
    matches: HashMap<NodeIndex, NodeIndex>,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(
        old: &'a ParseTree,
        new: &'a ParseTree,
        regions: &'a [Region],
        scope: RebindScope,
        materialized: impl IntoIterator<Item = NodeIndex>,
    ) -> Self {
        let mut wanted = HashSet::new();
        for index in materialized {
            let mut current = Some(index);
            while let Some(node) = current {
                if !wanted.insert(node) {
                    break;
                }
                current = old.node(node).parent;
            }
        }
        Self {
            old,
            new,
            regions,
            scope,
            wanted,
            matches: HashMap::new(),
        }
    }

    /// Old index -> new index for every rebindable wanted node.
    pub(crate) fn run(mut self) -> HashMap<NodeIndex, NodeIndex> {
        let (old_root, new_root) = (self.old.root(), self.new.root());
        self.matches.insert(old_root, new_root);
        self.walk(old_root, new_root);
        self.matches
    }

    fn may_rebind(&self, index: NodeIndex) -> bool {
        let node = self.old.node(index);
        if !self.regions.iter().any(|r| r.overlaps(node.start, node.end)) {
            return true;
        }
        match self.scope {
            RebindScope::Ancestors(parent) => self.old.is_ancestor_or_self(index, parent),
            RebindScope::Containing => true,
        }
    }

    fn walk(&mut self, old_parent: NodeIndex, new_parent: NodeIndex) {
        let (old, new) = (self.old, self.new);
        let new_children = new.children(new_parent);
        let mut next = 0;
        for &old_child in old.children(old_parent) {
            if !self.wanted.contains(&old_child) || !self.may_rebind(old_child) {
                continue;
            }
            let Some(found) = self.find_unique(old_child, &new_children[next..]) else {
                continue;
            };
            let new_child = new_children[next + found];
            next += found + 1;
            self.matches.insert(old_child, new_child);
            if !old.children(old_child).is_empty() {
                self.walk(old_child, new_child);
            }
        }
    }

    fn find_unique(&self, old_child: NodeIndex, candidates: &[NodeIndex]) -> Option<usize> {
        let node = self.old.node(old_child);
        let start = map_offset(self.regions, node.start);
        let end = map_offset(self.regions, node.end);
        let limit = start.highest()?;
        end.highest()?;

        let mut found = None;
        for (i, &candidate) in candidates.iter().enumerate() {
            let new = self.new.node(candidate);
            if new.start > limit {
                break;
            }
            if new.kind == node.kind && start.accepts(new.start) && end.accepts(new.end) {
                if found.is_some() {
                    return None;
                }
                found = Some(i);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::LanguageParser;
    use ast_grep_language::SupportLang;

    fn region(start: usize, end: usize, new_len: usize) -> Region {
        Region {
            start,
            end,
            new_len,
        }
    }

    #[test]
    fn offsets_shift_past_edits() {
        let regions = [region(5, 5, 3), region(10, 12, 0)];
        assert_eq!(map_offset(&regions, 2), Mapped::At(2));
        assert_eq!(map_offset(&regions, 5), Mapped::Either(5, 8));
        assert_eq!(map_offset(&regions, 7), Mapped::At(10));
        assert_eq!(map_offset(&regions, 11), Mapped::Gone);
        assert_eq!(map_offset(&regions, 12), Mapped::At(13));
    }

    #[test]
    fn insertion_overlap_is_strict() {
        let insert = region(10, 10, 4);
        assert!(!insert.overlaps(10, 20));
        assert!(!insert.overlaps(0, 10));
        assert!(insert.overlaps(5, 15));
        assert!(region(8, 12, 0).overlaps(10, 20));
    }

    #[test]
    fn untouched_statements_are_matched() {
        let mut parser = LanguageParser::new(SupportLang::TypeScript).unwrap();
        let old = parser.parse("let a = 1;\nlet b = 2;").unwrap();
        let edit = TextEdit::insert(0, "let z = 0;\n");
        let new = parser.parse(&edit.apply(old.text()).unwrap()).unwrap();
        let regions = regions_of(&[edit]);

        let old_list = old.children(old.root())[0];
        let old_b = old.children(old_list)[1];
        let matches = Reconciler::new(
            &old,
            &new,
            &regions,
            RebindScope::Ancestors(old_list),
            [old_b],
        )
        .run();

        let new_list = new.children(new.root())[0];
        assert_eq!(matches[&old_b], new.children(new_list)[2]);
        assert_eq!(matches[&old_list], new_list);
    }
}
