//! Callback traversal over structural children.
//!
//! Each level is wrapped before any callback runs, so callbacks may edit the
//! file mid-walk; wrappers forgotten in the meantime are skipped.

use crate::errors::Result;
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Stop,
    Skip,
    Up,
}

/// Steers the walk from inside a callback. Only the last call made during
/// one callback takes effect.
#[derive(Debug, Default, Clone)]
pub struct TraversalControl {
    signal: Option<Signal>,
}

impl TraversalControl {
    /// End the whole walk after this callback.
    pub fn stop(&mut self) {
        self.signal = Some(Signal::Stop);
    }

    /// Do not descend into the current node.
    pub fn skip(&mut self) {
        self.signal = Some(Signal::Skip);
    }

    /// Skip the current node's children and its remaining siblings.
    pub fn up(&mut self) {
        self.signal = Some(Signal::Up);
    }
}

enum Step<T> {
    Continue,
    Stop,
    Found(T),
}

fn walk_level<T, F>(parent: &Node, callback: &mut F) -> Result<Step<T>>
where
    F: FnMut(&Node, &mut TraversalControl) -> Option<T>,
{
    let snapshot = parent.structural_children()?;
    for child in snapshot {
        if child.was_forgotten() {
            continue;
        }
        let mut control = TraversalControl::default();
        if let Some(value) = callback(&child, &mut control) {
            return Ok(Step::Found(value));
        }
        match control.signal {
            Some(Signal::Stop) => return Ok(Step::Stop),
            Some(Signal::Up) => return Ok(Step::Continue),
            Some(Signal::Skip) => continue,
            None if child.was_forgotten() => continue,
            None => {}
        }
        match walk_level(&child, callback)? {
            Step::Continue => {}
            other => return Ok(other),
        }
    }
    Ok(Step::Continue)
}

impl Node {
    /// Visit the structural children. Only `stop` has an effect here.
    pub fn for_each_child<T>(
        &self,
        mut callback: impl FnMut(&Node, &mut TraversalControl) -> Option<T>,
    ) -> Result<Option<T>> {
        for child in self.structural_children()? {
            if child.was_forgotten() {
                continue;
            }
            let mut control = TraversalControl::default();
            if let Some(value) = callback(&child, &mut control) {
                return Ok(Some(value));
            }
            if control.signal == Some(Signal::Stop) {
                break;
            }
        }
        Ok(None)
    }

    /// Pre-order walk over structural descendants. Returning `Some` ends the
    /// walk with that value.
    pub fn for_each_descendant<T>(
        &self,
        mut callback: impl FnMut(&Node, &mut TraversalControl) -> Option<T>,
    ) -> Result<Option<T>> {
        match walk_level(self, &mut callback)? {
            Step::Found(value) => Ok(Some(value)),
            Step::Continue | Step::Stop => Ok(None),
        }
    }
}
