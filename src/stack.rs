//! The graph-structured stack.
//!
//! Every live parse shares one DAG of stack entries: a head is an index
//! into the current tops, and entries whose histories have converged are
//! represented once, with one successor link per distinct history towards
//! the stack bottom. Entries live in a per-parse arena and are reclaimed
//! wholesale by [`Stack::clear`]; popping never mutates an entry that
//! another path can still reach.

use std::cmp::Ordering;

use crate::{language::StateId, length::Length, tree::Tree};

/// Pop enumeration is capped so that pathological ambiguity cannot fan out
/// without bound.
const MAX_POP_PATHS: usize = 32;

/// Index of an entry in the stack's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryId(u32);

#[derive(Debug)]
struct StackEntry {
    state:      StateId,
    position:   Length,
    /// `None` only for the base entry.
    tree:       Option<Tree>,
    /// Links towards the stack bottom, one per distinct history.
    successors: Vec<EntryId>,
}

/// The outcome of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Push {
    /// The head gained a new top entry.
    Continued,
    /// Another head already sat at the same state and position; the two
    /// merged and the pushing head is gone.
    Merged,
}

/// One enumerated path of a pop.
#[derive(Debug)]
pub(crate) struct PopResult {
    /// The head left standing at the path's bottom. The first result keeps
    /// the original head index; later results are freshly added heads.
    pub(crate) head_index: usize,
    /// The popped trees, bottom-most first.
    pub(crate) trees:      Vec<Tree>,
}

/// Chooses between two trees competing for the same `(state, position)`
/// during a merge. `Greater` means the incoming (right) tree wins.
pub(crate) type TreeSelection = Box<dyn Fn(&Tree, &Tree) -> Ordering + Send + Sync>;

pub(crate) struct Stack {
    entries:  Vec<StackEntry>,
    heads:    Vec<EntryId>,
    selector: Option<TreeSelection>,
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("entries", &self.entries.len())
            .field("heads", &self.heads)
            .finish_non_exhaustive()
    }
}

impl Stack {
    pub(crate) fn new() -> Self {
        let mut stack = Stack {
            entries:  Vec::new(),
            heads:    Vec::new(),
            selector: None,
        };
        stack.clear();
        stack
    }

    /// Resets to a single head over a fresh base entry, reclaiming the
    /// previous parse's arena.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.entries.push(StackEntry {
            state:      StateId::START,
            position:   Length::ZERO,
            tree:       None,
            successors: Vec::new(),
        });
        self.heads.clear();
        self.heads.push(EntryId(0));
    }

    /// Installs the comparator used when pushes merge.
    pub(crate) fn set_tree_selection(&mut self, selector: TreeSelection) {
        self.selector = Some(selector);
    }

    #[inline]
    pub(crate) fn head_count(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn head_entry(&self, head: usize) -> EntryId {
        self.heads[head]
    }

    #[inline]
    pub(crate) fn top_state(&self, head: usize) -> StateId {
        self.entries[self.heads[head].0 as usize].state
    }

    #[inline]
    pub(crate) fn top_position(&self, head: usize) -> Length {
        self.entries[self.heads[head].0 as usize].position
    }

    #[inline]
    pub(crate) fn entry_state(&self, entry: EntryId) -> StateId {
        self.entries[entry.0 as usize].state
    }

    /// The `i`-th successor of an entry; the base entry has none.
    #[inline]
    pub(crate) fn successor(&self, entry: EntryId, i: usize) -> Option<EntryId> {
        self.entries[entry.0 as usize].successors.get(i).copied()
    }

    /// Duplicates a head in place; both now share every entry.
    pub(crate) fn split(&mut self, head: usize) -> usize {
        self.heads.push(self.heads[head]);
        self.heads.len() - 1
    }

    pub(crate) fn remove_head(&mut self, head: usize) {
        self.heads.remove(head);
    }

    /// Pushes `tree` onto a head, moving it to `state`.
    ///
    /// If another head already tops out at the same `(state, position)` the
    /// two merge: the selection callback picks the surviving tree, the
    /// pushing head's history becomes one more successor of the shared
    /// entry, and the pushing head disappears.
    pub(crate) fn push(&mut self, head: usize, tree: Tree, state: StateId) -> Push {
        let below = self.heads[head];
        let position = self.entries[below.0 as usize].position + tree.total_size();

        for other in 0..self.heads.len() {
            if other == head {
                continue;
            }
            let top = self.heads[other];
            let existing = &self.entries[top.0 as usize];
            if existing.state != state || existing.position != position {
                continue;
            }
            let incoming_wins = match (&existing.tree, &self.selector) {
                (Some(existing_tree), Some(selector)) => {
                    selector(existing_tree, &tree) == Ordering::Greater
                }
                (None, _) => true,
                (Some(_), None) => false,
            };
            let entry = &mut self.entries[top.0 as usize];
            if incoming_wins {
                entry.tree = Some(tree);
            }
            if !entry.successors.contains(&below) {
                entry.successors.push(below);
            }
            self.heads.remove(head);
            return Push::Merged;
        }

        let id = EntryId(self.entries.len() as u32);
        self.entries.push(StackEntry {
            state,
            position,
            tree: Some(tree),
            successors: vec![below],
        });
        self.heads[head] = id;
        Push::Continued
    }

    /// Pops entries below a head, enumerating every distinct history.
    ///
    /// `n` counts structural entries unless `count_extras` is set (extras
    /// above the stopping point are collected either way; extras below it
    /// are left alone). `n = None` pops everything down to the base. The
    /// first path reuses `head`; every further path becomes a new head at
    /// its own bottom entry.
    pub(crate) fn pop(&mut self, head: usize, n: Option<u32>, count_extras: bool) -> Vec<PopResult> {
        if n == Some(0) {
            return vec![PopResult {
                head_index: head,
                trees:      Vec::new(),
            }];
        }

        struct Frame {
            entry: EntryId,
            trees: Vec<Tree>,
            count: u32,
        }

        let mut paths: Vec<(Vec<Tree>, EntryId)> = Vec::new();
        let mut work = vec![Frame {
            entry: self.heads[head],
            trees: Vec::new(),
            count: 0,
        }];

        while let Some(frame) = work.pop() {
            if paths.len() >= MAX_POP_PATHS {
                break;
            }
            if matches!(n, Some(goal) if frame.count >= goal) {
                paths.push((frame.trees, frame.entry));
                continue;
            }
            let entry = &self.entries[frame.entry.0 as usize];
            let Some(tree) = entry.tree.clone() else {
                // The base: everything above it has been collected.
                paths.push((frame.trees, frame.entry));
                continue;
            };
            let count = frame.count + u32::from(count_extras || !tree.is_extra());
            // Reversed so the first successor is explored first and the
            // enumeration order is deterministic.
            for successor in entry.successors.clone().into_iter().rev() {
                let mut trees = frame.trees.clone();
                trees.push(tree.clone());
                work.push(Frame {
                    entry: successor,
                    trees,
                    count,
                });
            }
        }

        let mut results = Vec::with_capacity(paths.len());
        for (i, (mut trees, below)) in paths.into_iter().enumerate() {
            trees.reverse();
            let head_index = if i == 0 {
                self.heads[head] = below;
                head
            } else {
                self.heads.push(below);
                self.heads.len() - 1
            };
            results.push(PopResult { head_index, trees });
        }
        results
    }

    /// Moves a head's recorded position forward without pushing; used when
    /// an error reduction absorbs the offending lookahead's padding.
    pub(crate) fn adjust_head_position(&mut self, head: usize, delta: Length) {
        let entry = &mut self.entries[self.heads[head].0 as usize];
        entry.position += delta;
    }

    /// Grows the size of the tree stored at `entry` (copy-on-write).
    pub(crate) fn grow_entry_tree(&mut self, entry: EntryId, delta: Length) {
        if let Some(tree) = &mut self.entries[entry.0 as usize].tree {
            tree.make_mut().size += delta;
        }
    }

    /// Marks the tree stored at `entry` fragile on both sides and clears
    /// its parse state (copy-on-write).
    pub(crate) fn mark_entry_fragile(&mut self, entry: EntryId) {
        if let Some(tree) = &mut self.entries[entry.0 as usize].tree {
            let data = tree.make_mut();
            data.fragile_left = true;
            data.fragile_right = true;
            data.parse_state = None;
        }
    }

    /// The tree stored at `entry`, if it is not the base.
    #[cfg(test)]
    pub(crate) fn entry_tree(&self, entry: EntryId) -> Option<&Tree> {
        self.entries[entry.0 as usize].tree.as_ref()
    }
}
