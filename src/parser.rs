//! The GLR parser driver.
//!
//! A parse advances a set of stack heads over the input in lockstep,
//! least-position first. For every head the driver obtains a lookahead tree
//! -- reused from the previous syntax tree when positions and states line
//! up, lexed otherwise -- and performs the table's actions for it, splitting
//! the stack when the table is ambiguous and merging heads that converge.
//! Syntax errors are recovered in-band by unwinding to a state that can
//! shift an `ERROR`, or by skipping tokens; the parse itself never fails.

use std::{cmp::Ordering, fmt};

use triomphe::Arc;

use crate::{
    language::{ActionKind, Language, LexStateId, ParseAction, StateId, Symbol},
    length::Length,
    lexer::{Input, Lexer},
    stack::{EntryId, Push, Stack},
    syntax::SyntaxTree,
    tree::{self, Tree},
};

/// The kind of event a [`Debugger`] receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugEvent {
    /// Emitted by the lexing machinery.
    Lex,
    /// Emitted by the parse loop.
    Parse,
}

/// A per-parser sink for debug messages.
///
/// Messages are terse `name key:value` lines describing each lex and parse
/// step; installing a debugger has no effect on the parse result.
pub struct Debugger {
    callback: Box<dyn FnMut(DebugEvent, &str) + Send>,
}

impl Debugger {
    /// Wraps a callback.
    pub fn new(callback: impl FnMut(DebugEvent, &str) + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for Debugger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debugger").finish_non_exhaustive()
    }
}

macro_rules! log {
    ($self:expr, $($arg:tt)*) => {
        if $self.debugger.is_some() {
            let message = format!($($arg)*);
            $self.emit(DebugEvent::Parse, &message);
        }
    };
}

/// A cursor over the previous syntax tree, yielding the subtree that starts
/// at the cursor's position.
///
/// The descent stack replaces the original parent back-pointers: each entry
/// remembers its index in the entry above, so moving to the next sibling or
/// back up needs no links inside the trees themselves.
#[derive(Clone)]
struct ReusableNode {
    stack: Vec<ReusableEntry>,
}

#[derive(Clone)]
struct ReusableEntry {
    tree:  Tree,
    index: usize,
    start: Length,
}

impl ReusableNode {
    fn new(root: Option<Tree>) -> Self {
        Self {
            stack: root
                .map(|tree| {
                    vec![ReusableEntry {
                        tree,
                        index: 0,
                        start: Length::ZERO,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn tree(&self) -> Option<&Tree> {
        self.stack.last().map(|entry| &entry.tree)
    }

    fn position(&self) -> Length {
        self.stack.last().map(|entry| entry.start).unwrap_or(Length::ZERO)
    }

    /// Advances past the current subtree to its next sibling, walking up as
    /// long as the current subtree is its parent's last child.
    fn pop(&mut self) {
        let mut entry = match self.stack.pop() {
            Some(entry) => entry,
            None => return,
        };
        loop {
            let end = entry.start + entry.tree.total_size();
            match self.stack.last() {
                Some(parent) => {
                    let next_index = entry.index + 1;
                    if let Some(sibling) = parent.tree.child(next_index) {
                        let sibling = sibling.clone();
                        self.stack.push(ReusableEntry {
                            tree:  sibling,
                            index: next_index,
                            start: end,
                        });
                        return;
                    }
                    entry = self.stack.pop().expect("parent was just observed");
                }
                None => return,
            }
        }
    }

    /// Descends into the current subtree's first child, skipping on through
    /// fragile children; leaves and error subtrees are popped instead.
    fn breakdown(&mut self) {
        loop {
            let Some(current) = self.stack.last() else {
                return;
            };
            if current.tree.is_error() || current.tree.child_count() == 0 {
                self.pop();
                return;
            }
            let first = current.tree.child(0).expect("non-leaf has children").clone();
            let start = current.start;
            self.stack.push(ReusableEntry {
                tree: first,
                index: 0,
                start,
            });
            if !self.stack.last().expect("just pushed").tree.is_fragile() {
                return;
            }
        }
    }
}

/// Per-head incremental state.
#[derive(Clone)]
struct LookaheadState {
    reusable:     ReusableNode,
    is_verifying: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseResult {
    UpdatedStackHead,
    RemovedStackHead,
}

use ParseResult::{RemovedStackHead, UpdatedStackHead};

/// An incremental GLR parser.
///
/// A parser is configured with a [`Language`] and then reused across
/// parses; every call to [`Parser::parse`] starts from a clean stack. Pass
/// the previous [`SyntaxTree`] -- edited to describe the source change -- to
/// reuse its unchanged subtrees.
///
/// ```rust,ignore
/// let mut parser = Parser::new();
/// parser.set_language(language);
/// let tree = parser.parse(Box::new(StringInput::new("a b")), None).unwrap();
/// let edited = tree.edit(&InputEdit::insertion(3, 1));
/// let tree2 = parser.parse(Box::new(StringInput::new("a bc")), Some(&edited)).unwrap();
/// ```
pub struct Parser {
    language:         Option<Arc<Language>>,
    lexer:            Lexer,
    stack:            Stack,
    lookahead_states: Vec<LookaheadState>,
    reduce_entries:   Vec<EntryId>,
    finished_tree:    Option<Tree>,
    is_split:         bool,
    debugger:         Option<Debugger>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .field("head_count", &self.stack.head_count())
            .finish_non_exhaustive()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a parser with no language configured.
    pub fn new() -> Self {
        let mut stack = Stack::new();
        stack.set_tree_selection(Box::new(|existing, incoming| tree::compare(existing, incoming)));
        Self {
            language: None,
            lexer: Lexer::new(),
            stack,
            lookahead_states: Vec::new(),
            reduce_entries: Vec::new(),
            finished_tree: None,
            is_split: false,
            debugger: None,
        }
    }

    /// Sets the language to parse with.
    pub fn set_language(&mut self, language: Language) {
        self.language = Some(Arc::new(language));
    }

    /// The configured language.
    pub fn language(&self) -> Option<&Arc<Language>> {
        self.language.as_ref()
    }

    /// Installs (or removes) the debug sink.
    pub fn set_debugger(&mut self, debugger: Option<Debugger>) {
        self.debugger = debugger;
    }

    /// The installed debug sink.
    pub fn debugger(&self) -> Option<&Debugger> {
        self.debugger.as_ref()
    }

    fn emit(&mut self, event: DebugEvent, message: &str) {
        if let Some(debugger) = &mut self.debugger {
            (debugger.callback)(event, message);
        }
    }

    /// Parses `input`, reusing unchanged subtrees of `previous_tree` when
    /// one is given.
    ///
    /// Returns `None` only when no language is configured or the language's
    /// lex function breaks its contract and produces no tree; syntax errors
    /// in the input are represented as `ERROR` nodes inside the returned
    /// tree instead.
    pub fn parse(&mut self, input: Box<dyn Input>, previous_tree: Option<&SyntaxTree>) -> Option<SyntaxTree> {
        let language = self.language.clone()?;
        self.start(input, previous_tree);

        let mut max_position = 0u32;
        loop {
            let mut lookahead: Option<Tree> = None;
            let mut position = 0u32;

            self.is_split = self.stack.head_count() > 1;

            let mut head = 0;
            while head < self.stack.head_count() {
                let mut removed = false;
                while !removed {
                    let last_position = position;
                    let new_position = self.stack.top_position(head).chars;

                    if new_position > max_position {
                        max_position = new_position;
                        head += 1;
                        break;
                    } else if new_position == max_position && head > 0 {
                        head += 1;
                        break;
                    }
                    position = new_position;

                    log!(
                        self,
                        "process head:{}, head_count:{}, state:{}, pos:{}",
                        head,
                        self.stack.head_count(),
                        self.stack.top_state(head).0,
                        position
                    );

                    let reusable = match &lookahead {
                        Some(tree) => position == last_position && self.can_reuse(&language, head, tree),
                        None => false,
                    };
                    if !reusable {
                        lookahead = Some(self.get_next_lookahead(&language, head)?);
                    }
                    let tree = lookahead.clone().expect("lookahead was just produced");

                    log!(
                        self,
                        "lookahead sym:{}, size:{}",
                        language.name(tree.symbol()).for_display(),
                        tree.total_chars()
                    );

                    match self.consume_lookahead(&language, head, &tree) {
                        RemovedStackHead => removed = true,
                        UpdatedStackHead => {}
                    }
                }
            }

            if self.stack.head_count() == 0 {
                self.stack.clear();
                self.lexer.take_input();
                let root = self.finished_tree.take()?;
                return Some(SyntaxTree::new(root, language));
            }
        }
    }

    fn start(&mut self, input: Box<dyn Input>, previous_tree: Option<&SyntaxTree>) {
        if previous_tree.is_some() {
            log!(self, "parse_after_edit");
        } else {
            log!(self, "new_parse");
        }
        self.lexer.set_input(input);
        self.stack.clear();
        self.lookahead_states.clear();
        self.lookahead_states.push(LookaheadState {
            reusable:     ReusableNode::new(previous_tree.map(|tree| tree.root_tree().clone())),
            is_verifying: false,
        });
        self.finished_tree = None;
        self.is_split = false;
    }

    /// Replaces the top of a head with the children of the tree stored
    /// there, repeatedly, until the top is a leaf. Used when a reused
    /// subtree turns out not to match what follows it.
    fn breakdown_top_of_stack(&mut self, language: &Language, head: usize) {
        let mut last_child: Option<Tree> = None;
        loop {
            let pop_results = self.stack.pop(head, Some(1), false);
            for result in pop_results {
                let head_index = result.head_index;
                let mut trees = result.trees.into_iter();
                let Some(parent) = trees.next() else {
                    continue;
                };
                log!(
                    self,
                    "breakdown_pop sym:{}, size:{}",
                    language.name(parent.symbol()).for_display(),
                    parent.total_chars()
                );

                let mut state = self.stack.top_state(head_index);
                let mut merged = false;
                for child in parent.children() {
                    let child = child.clone();
                    if !child.is_extra() {
                        let action = language.last_action(state, child.symbol());
                        debug_assert!(
                            matches!(action, Some(ParseAction { kind: ActionKind::Shift { .. }, .. })),
                            "broken-down child must be shiftable"
                        );
                        if let Some(ParseAction {
                            kind: ActionKind::Shift { state: to_state },
                            ..
                        }) = action
                        {
                            state = to_state;
                        }
                    }
                    log!(
                        self,
                        "breakdown_push sym:{}, size:{}",
                        language.name(child.symbol()).for_display(),
                        child.total_chars()
                    );
                    last_child = Some(child.clone());
                    if self.stack.push(head_index, child, state) == Push::Merged {
                        merged = true;
                        break;
                    }
                }
                if merged {
                    continue;
                }
                // Extras that were popped above the broken-down tree.
                for tree in trees {
                    if self.stack.push(head_index, tree, state) == Push::Merged {
                        break;
                    }
                }
            }
            if !matches!(&last_child, Some(child) if child.child_count() > 0) {
                break;
            }
        }
    }

    fn can_reuse(&self, language: &Language, head: usize, subtree: &Tree) -> bool {
        if subtree.symbol().is_error() {
            return false;
        }
        let state = self.stack.top_state(head);
        if subtree.is_fragile() && subtree.parse_state() != Some(state) {
            return false;
        }
        if let Some(lex_state) = subtree.lex_state() {
            if lex_state != language.lex_state(state) {
                return false;
            }
        }
        let Some(action) = language.last_action(state, subtree.symbol()) else {
            return false;
        };
        if action.can_hide_split {
            return false;
        }
        if subtree.is_extra() && !action.extra {
            return false;
        }
        true
    }

    /// Produces the next lookahead for a head: a reusable subtree of the
    /// previous tree when position, change and reuse checks line up, a
    /// freshly lexed token otherwise.
    fn get_next_lookahead(&mut self, language: &Language, head: usize) -> Option<Tree> {
        let position = self.stack.top_position(head);

        loop {
            let (subtree, subtree_position) = {
                let state = &self.lookahead_states[head];
                match state.reusable.tree() {
                    Some(tree) => (tree.clone(), state.reusable.position()),
                    None => break,
                }
            };

            if subtree_position.chars > position.chars {
                break;
            }
            if subtree_position.chars < position.chars {
                log!(self, "past_reusable sym:{}", language.name(subtree.symbol()).for_display());
                self.lookahead_states[head].reusable.pop();
                continue;
            }

            if subtree.has_changes() {
                if self.lookahead_states[head].is_verifying && subtree.child_count() == 0 {
                    self.breakdown_top_of_stack(language, head);
                    self.lookahead_states[head].is_verifying = false;
                }
                log!(
                    self,
                    "breakdown_changed sym:{}",
                    language.name(subtree.symbol()).for_display()
                );
                self.lookahead_states[head].reusable.breakdown();
                continue;
            }

            if !self.can_reuse(language, head, &subtree) {
                log!(
                    self,
                    "breakdown_unreusable sym:{}",
                    language.name(subtree.symbol()).for_display()
                );
                self.lookahead_states[head].reusable.breakdown();
                continue;
            }

            log!(
                self,
                "reuse sym:{}, size:{}",
                language.name(subtree.symbol()).for_display(),
                subtree.total_chars()
            );
            self.lookahead_states[head].reusable.pop();
            return Some(subtree);
        }

        self.lexer.reset(position);
        let parse_state = self.stack.top_state(head);
        let lex_state = language.lex_state(parse_state);
        log!(self, "lex state:{}", lex_state.0);
        if self.debugger.is_some() {
            self.emit(DebugEvent::Lex, &format!("start_lex state:{}, pos:{}", lex_state.0, position.chars));
        }
        language.lex(&mut self.lexer, lex_state, false)
    }

    fn split_head(&mut self, head: usize) -> usize {
        let new_head = self.stack.split(head);
        debug_assert_eq!(new_head, self.lookahead_states.len());
        let state = self.lookahead_states[head].clone();
        self.lookahead_states.push(state);
        new_head
    }

    fn remove_head(&mut self, head: usize) {
        if head < self.lookahead_states.len() {
            self.lookahead_states.remove(head);
        }
        self.stack.remove_head(head);
    }

    fn shift(&mut self, head: usize, state: StateId, lookahead: Tree) -> ParseResult {
        match self.stack.push(head, lookahead, state) {
            Push::Merged => {
                log!(self, "merge head:{head}");
                if head < self.lookahead_states.len() {
                    self.lookahead_states.remove(head);
                }
                RemovedStackHead
            }
            Push::Continued => UpdatedStackHead,
        }
    }

    fn shift_extra(&mut self, head: usize, state: StateId, lookahead: &Tree) -> ParseResult {
        // Copy-on-write: marking the extra bit never touches the shared
        // lookahead other heads may still shift.
        let mut tree = lookahead.clone();
        tree.make_mut().extra = true;
        self.shift(head, state, tree)
    }

    #[allow(clippy::too_many_arguments)]
    fn reduce(
        &mut self,
        language: &Language,
        head: usize,
        symbol: Symbol,
        child_count: Option<u32>,
        extra: bool,
        fragile: bool,
        count_extras: bool,
        dynamic_precedence: i32,
    ) -> ParseResult {
        self.reduce_entries.clear();
        let metadata = language.metadata(symbol);
        let pop_results = self.stack.pop(head, child_count, count_extras);
        let result_count = pop_results.len();
        let mut removed_heads = 0usize;

        for (i, pop_result) in pop_results.into_iter().enumerate() {
            let mut trees = pop_result.trees;
            let trailing_extra_count = trees.iter().rev().take_while(|tree| tree.is_extra()).count();
            let extras: Vec<Tree> = trees.split_off(trees.len() - trailing_extra_count);
            let mut parent = Tree::node(symbol, trees, metadata, dynamic_precedence);

            let new_head = pop_result.head_index - removed_heads;

            if i > 0 {
                if symbol == Symbol::ERROR {
                    // Error reductions keep only the first history.
                    self.stack.remove_head(new_head);
                    removed_heads += 1;
                    continue;
                }
                log!(self, "split_during_reduce new_head:{new_head}");
                let state = self.lookahead_states[head].clone();
                self.lookahead_states.push(state);
            }

            let top_state = self.stack.top_state(new_head);
            parent.make_mut().parse_state = Some(top_state);

            let state = if extra {
                parent.make_mut().extra = true;
                top_state
            } else if child_count.is_none() {
                StateId::START
            } else {
                match language.last_action(top_state, symbol) {
                    Some(ParseAction {
                        kind: ActionKind::Shift { state },
                        ..
                    }) => state,
                    action => {
                        debug_assert!(false, "no goto for reduced symbol: {action:?}");
                        StateId::START
                    }
                }
            };

            match self.stack.push(new_head, parent, state) {
                Push::Merged => {
                    log!(self, "merge_during_reduce head:{new_head}");
                    if new_head < self.lookahead_states.len() {
                        self.lookahead_states.remove(new_head);
                    }
                    removed_heads += 1;
                    continue;
                }
                Push::Continued => {
                    self.reduce_entries.push(self.stack.head_entry(new_head));
                }
            }

            for tree in extras {
                match self.stack.push(new_head, tree, state) {
                    Push::Merged => {
                        if new_head < self.lookahead_states.len() {
                            self.lookahead_states.remove(new_head);
                        }
                        removed_heads += 1;
                        break;
                    }
                    Push::Continued => {}
                }
            }
        }

        if fragile || self.is_split || self.stack.head_count() > 1 {
            for i in 0..self.reduce_entries.len() {
                let entry = self.reduce_entries[i];
                self.stack.mark_entry_fragile(entry);
            }
        }

        if removed_heads < result_count {
            UpdatedStackHead
        } else {
            RemovedStackHead
        }
    }

    /// Reduces the popped span into an `ERROR` node and absorbs the
    /// offending lookahead's padding into it, so that the head's position
    /// lands exactly on the lookahead's content.
    fn reduce_error(
        &mut self,
        language: &Language,
        head: usize,
        child_count: Option<u32>,
        lookahead: &mut Tree,
    ) -> ParseResult {
        match self.reduce(language, head, Symbol::ERROR, child_count, false, true, true, 0) {
            RemovedStackHead => RemovedStackHead,
            UpdatedStackHead => {
                let padding = lookahead.padding();
                if !padding.is_zero() {
                    self.stack.adjust_head_position(head, padding);
                    if let Some(&entry) = self.reduce_entries.first() {
                        self.stack.grow_entry_tree(entry, padding);
                    }
                    lookahead.make_mut().padding = Length::ZERO;
                }
                UpdatedStackHead
            }
        }
    }

    /// Error recovery for the last live head.
    fn handle_error(&mut self, language: &Language, head: usize, lookahead: Tree) -> ParseResult {
        let mut lookahead = lookahead;
        let mut error_token_count = 1i64;
        let entry_before_error = self.stack.head_entry(head);

        loop {
            // Unwind the stack until a state is found in which an error is
            // expected and the current lookahead is expected after it.
            let mut entry = Some(entry_before_error);
            let mut i = -1i64;
            while let Some(current) = entry {
                let stack_state = self.stack.entry_state(current);
                if let Some(ParseAction {
                    kind: ActionKind::Shift { state: state_after_error },
                    ..
                }) = language.last_action(stack_state, Symbol::ERROR)
                {
                    if language.last_action(state_after_error, lookahead.symbol()).is_some() {
                        log!(
                            self,
                            "recover state:{}, count:{}",
                            state_after_error.0,
                            error_token_count + i
                        );
                        let count = (error_token_count + i).max(0) as u32;
                        self.reduce_error(language, head, Some(count), &mut lookahead);
                        return UpdatedStackHead;
                    }
                }
                entry = self.stack.successor(current, 0);
                i += 1;
            }

            // No state can recover with this lookahead: shift it as-is and
            // force the lexer to produce the next token.
            log!(self, "skip token:{}", language.name(lookahead.symbol()).for_display());
            let state = self.stack.top_state(head);
            self.shift(head, state, lookahead.clone());

            self.lexer.reset(self.stack.top_position(head));
            let next = language.lex(&mut self.lexer, LexStateId::default(), true);
            error_token_count += 1;

            match next {
                Some(next) if next.symbol() != Symbol::END => lookahead = next,
                _ => {
                    log!(self, "fail_to_recover");
                    let mut end = next.unwrap_or_else(|| Tree::leaf(
                        Symbol::END,
                        Length::ZERO,
                        Length::ZERO,
                        language.metadata(Symbol::END),
                    ));
                    self.reduce_error(language, head, None, &mut end);
                    return RemovedStackHead;
                }
            }
        }
    }

    /// Finishes a head: pops the whole stack, splices the root's children
    /// up so extras outside the root become its direct children, and keeps
    /// the better of this root and any previously finished one.
    fn accept(&mut self, head: usize) -> ParseResult {
        let pop_results = self.stack.pop(head, None, true);
        let mut finished_heads: Vec<usize> = Vec::new();

        for pop_result in pop_results {
            let trees = pop_result.trees;
            let root_index = trees.iter().position(|tree| !tree.is_extra());
            finished_heads.push(pop_result.head_index);

            let Some(root_index) = root_index else {
                continue;
            };
            let mut root = trees[root_index].clone();
            let mut children: Vec<Tree> = Vec::with_capacity(trees.len() - 1 + root.child_count());
            children.extend(trees[..root_index].iter().cloned());
            children.extend(root.children().cloned());
            children.extend(trees[root_index + 1..].iter().cloned());
            root.set_children(children);

            let better = match &self.finished_tree {
                None => true,
                Some(finished) => tree::compare(&root, finished) == Ordering::Less,
            };
            if better {
                log!(self, "select_tree");
                self.finished_tree = Some(root);
            }
        }

        finished_heads.sort_unstable();
        for head_index in finished_heads.into_iter().rev() {
            self.remove_head(head_index);
        }
        RemovedStackHead
    }

    /// Performs parse actions for a head until the lookahead is consumed or
    /// the head dies.
    fn consume_lookahead(&mut self, language: &Language, head: usize, lookahead: &Tree) -> ParseResult {
        loop {
            let state = self.stack.top_state(head);
            let actions = language.actions(state, lookahead.symbol()).to_vec();
            let action_count = actions.len().max(1);

            for i in 0..action_count {
                let action = actions.get(i).copied();

                let current_head = if i == action_count - 1 {
                    head
                } else {
                    let new_head = self.split_head(head);
                    log!(self, "split_action from_head:{head}, new_head:{new_head}");
                    new_head
                };

                match action {
                    None => {
                        log!(self, "error_sym");
                        if self.lookahead_states[current_head].is_verifying {
                            self.breakdown_top_of_stack(language, current_head);
                            self.lookahead_states[current_head].is_verifying = false;
                            return RemovedStackHead;
                        }
                        if self.stack.head_count() == 1 {
                            return match self.handle_error(language, current_head, lookahead.clone()) {
                                UpdatedStackHead => UpdatedStackHead,
                                RemovedStackHead => self.accept(current_head),
                            };
                        }
                        log!(self, "bail current_head:{current_head}");
                        self.remove_head(current_head);
                        return RemovedStackHead;
                    }

                    Some(ParseAction {
                        kind: ActionKind::Shift { state: to_state },
                        extra,
                        ..
                    }) => {
                        if extra {
                            log!(self, "shift_extra");
                            return self.shift_extra(current_head, state, lookahead);
                        }
                        log!(self, "shift state:{}", to_state.0);
                        self.lookahead_states[current_head].is_verifying = lookahead.child_count() > 0;
                        return self.shift(current_head, to_state, lookahead.clone());
                    }

                    Some(ParseAction {
                        kind:
                            ActionKind::Reduce {
                                symbol,
                                child_count,
                                dynamic_precedence,
                            },
                        extra,
                        fragile,
                        ..
                    }) => {
                        self.lookahead_states[current_head].is_verifying = false;
                        let result = if extra {
                            log!(self, "reduce_extra sym:{}", language.name(symbol).for_display());
                            self.reduce(language, current_head, symbol, Some(1), true, false, false, 0)
                        } else {
                            log!(
                                self,
                                "reduce sym:{}, child_count:{}, fragile:{}",
                                language.name(symbol).for_display(),
                                child_count,
                                fragile
                            );
                            self.reduce(
                                language,
                                current_head,
                                symbol,
                                Some(child_count),
                                false,
                                fragile,
                                false,
                                dynamic_precedence,
                            )
                        };
                        if result == RemovedStackHead && current_head == head {
                            return RemovedStackHead;
                        }
                    }

                    Some(ParseAction {
                        kind: ActionKind::Accept, ..
                    }) => {
                        log!(self, "accept");
                        return self.accept(current_head);
                    }
                }
            }
        }
    }
}
