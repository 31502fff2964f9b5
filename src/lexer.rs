//! Input plumbing and the lexing machinery.
//!
//! The parser never sees the source text directly. It reads through an
//! [`Input`], which serves the text in chunks and can seek, and it lexes
//! through a [`Lexer`], which maintains the current position, the decoded
//! lookahead character and the start of the token in progress. A language's
//! lex function drives the lexer the way generated code drives the
//! original's: [`Lexer::start`], then [`Lexer::start_token`] and
//! [`Lexer::advance`] until a token is complete, then [`Lexer::accept`]
//! (or [`Lexer::accept_error`] when nothing matched).

use text_size::TextSize;

use crate::{
    language::{LexStateId, Symbol, SymbolMetadata},
    length::{Length, Point},
    tree::{EditInterval, Tree},
};

/// How the input bytes encode text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8.
    Utf8,
    /// UTF-16, little endian.
    Utf16,
}

/// A seekable, chunked source of text.
///
/// `read` returns the next chunk at the input's cursor and advances the
/// cursor past it; an empty chunk means end of input. `seek` repositions
/// the cursor (both coordinates refer to the same position).
pub trait Input {
    /// Repositions the cursor.
    fn seek(&mut self, chars: u32, bytes: TextSize);
    /// Returns the next chunk and advances past it. Empty at end of input.
    fn read(&mut self) -> &[u8];
    /// The text encoding.
    fn encoding(&self) -> Encoding {
        Encoding::Utf8
    }
}

/// An [`Input`] over an owned string, served in fixed-size chunks.
///
/// The chunk size is deliberately small by default so that chunk-boundary
/// handling is exercised even by short tests.
#[derive(Debug)]
pub struct StringInput {
    text:       String,
    position:   usize,
    chunk_size: usize,
}

impl StringInput {
    /// Creates an input over `text` with the default chunk size.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_chunk_size(text, 4)
    }

    /// Creates an input over `text` served in chunks of at most
    /// `chunk_size` bytes.
    pub fn with_chunk_size(text: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            text: text.into(),
            position: 0,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Input for StringInput {
    fn seek(&mut self, _chars: u32, bytes: TextSize) {
        self.position = u32::from(bytes) as usize;
    }

    fn read(&mut self) -> &[u8] {
        let bytes = self.text.as_bytes();
        let start = self.position.min(bytes.len());
        let end = (start + self.chunk_size).min(bytes.len());
        self.position = end;
        &bytes[start..end]
    }
}

/// A change made to the source text since the previous parse.
///
/// Bytes and row/column points describe the edit the way editors do; the
/// character counts keep the `chars` coordinate of [`Length`] exact, since
/// tree positions are tracked in all three units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdit {
    /// Byte offset where the edit starts.
    pub start_byte:     TextSize,
    /// Character offset where the edit starts.
    pub start_char:     u32,
    /// Row/column where the edit starts.
    pub start_point:    Point,
    /// Bytes removed, measured in the old text.
    pub bytes_removed:  TextSize,
    /// Characters removed.
    pub chars_removed:  u32,
    /// Extent removed.
    pub extent_removed: Point,
    /// Bytes added, measured in the new text.
    pub bytes_added:    TextSize,
    /// Characters added.
    pub chars_added:    u32,
    /// Extent added.
    pub extent_added:   Point,
}

impl InputEdit {
    /// A pure insertion of single-byte characters on one row.
    pub fn insertion(at: u32, chars: u32) -> Self {
        InputEdit {
            start_byte:     TextSize::new(at),
            start_char:     at,
            start_point:    Point::new(0, at),
            bytes_removed:  TextSize::new(0),
            chars_removed:  0,
            extent_removed: Point::ZERO,
            bytes_added:    TextSize::new(chars),
            chars_added:    chars,
            extent_added:   Point::new(0, chars),
        }
    }

    /// A pure removal of single-byte characters on one row.
    pub fn removal(at: u32, chars: u32) -> Self {
        InputEdit {
            start_byte:     TextSize::new(at),
            start_char:     at,
            start_point:    Point::new(0, at),
            bytes_removed:  TextSize::new(chars),
            chars_removed:  chars,
            extent_removed: Point::new(0, chars),
            bytes_added:    TextSize::new(0),
            chars_added:    0,
            extent_added:   Point::ZERO,
        }
    }

    pub(crate) fn interval(&self) -> EditInterval {
        let start = Length::new(self.start_char, self.start_byte, self.start_point);
        let removed = Length::new(self.chars_removed, self.bytes_removed, self.extent_removed);
        let added = Length::new(self.chars_added, self.bytes_added, self.extent_added);
        EditInterval {
            start,
            old_end: start + removed,
            new_end: start + added,
        }
    }
}

enum Decoded {
    Char(char, u32),
    Incomplete,
    Invalid(u32),
}

fn decode(bytes: &[u8], encoding: Encoding) -> Decoded {
    match encoding {
        Encoding::Utf8 => {
            let len = match bytes[0] {
                b if b < 0x80 => 1,
                b if b >= 0xc0 && b < 0xe0 => 2,
                b if b >= 0xe0 && b < 0xf0 => 3,
                b if b >= 0xf0 && b < 0xf8 => 4,
                _ => return Decoded::Invalid(1),
            };
            if bytes.len() < len {
                return Decoded::Incomplete;
            }
            match std::str::from_utf8(&bytes[..len]) {
                Ok(s) => Decoded::Char(s.chars().next().expect("non-empty str"), len as u32),
                Err(_) => Decoded::Invalid(1),
            }
        }
        Encoding::Utf16 => {
            if bytes.len() < 2 {
                return Decoded::Incomplete;
            }
            let unit = u16::from_le_bytes([bytes[0], bytes[1]]);
            if (0xd800..0xdc00).contains(&unit) {
                if bytes.len() < 4 {
                    return Decoded::Incomplete;
                }
                let low = u16::from_le_bytes([bytes[2], bytes[3]]);
                match char::decode_utf16([unit, low]).next() {
                    Some(Ok(ch)) => Decoded::Char(ch, 4),
                    _ => Decoded::Invalid(2),
                }
            } else {
                match char::decode_utf16([unit]).next() {
                    Some(Ok(ch)) => Decoded::Char(ch, 2),
                    _ => Decoded::Invalid(2),
                }
            }
        }
    }
}

/// The lexing machinery: chunk buffer, position bookkeeping and the
/// decoded lookahead character.
pub struct Lexer {
    input: Option<Box<dyn Input>>,

    chunk:       Vec<u8>,
    chunk_start: u32,
    needs_seek:  bool,

    current_position:     Length,
    token_start_position: Length,
    token_end_position:   Length,

    lookahead:       Option<char>,
    lookahead_bytes: u32,
    lookahead_ready: bool,

    starting_state: LexStateId,
}

impl std::fmt::Debug for Lexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.current_position)
            .field("lookahead", &self.lookahead)
            .finish_non_exhaustive()
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    /// Creates a lexer with no input attached.
    pub fn new() -> Self {
        Self {
            input: None,
            chunk: Vec::new(),
            chunk_start: 0,
            needs_seek: false,
            current_position: Length::ZERO,
            token_start_position: Length::ZERO,
            token_end_position: Length::ZERO,
            lookahead: None,
            lookahead_bytes: 0,
            lookahead_ready: false,
            starting_state: LexStateId::default(),
        }
    }

    pub(crate) fn set_input(&mut self, input: Box<dyn Input>) {
        self.input = Some(input);
        self.chunk.clear();
        self.chunk_start = 0;
        self.needs_seek = false;
        self.current_position = Length::ZERO;
        self.token_start_position = Length::ZERO;
        self.token_end_position = Length::ZERO;
        self.lookahead = None;
        self.lookahead_bytes = 0;
        self.lookahead_ready = false;
    }

    pub(crate) fn take_input(&mut self) -> Option<Box<dyn Input>> {
        self.input.take()
    }

    /// Repositions the lexer; the next token's padding starts here.
    pub(crate) fn reset(&mut self, position: Length) {
        if position != self.current_position {
            self.current_position = position;
            self.token_start_position = position;
            self.token_end_position = position;
            self.chunk.clear();
            self.chunk_start = u32::from(position.bytes);
            self.needs_seek = true;
            self.lookahead = None;
            self.lookahead_bytes = 0;
            self.lookahead_ready = false;
        }
    }

    /// The current position.
    #[inline]
    pub fn position(&self) -> Length {
        self.current_position
    }

    /// Begins lexing in `lex_state`: makes sure a lookahead is decoded and
    /// remembers the state for tokens that depend on it.
    pub fn start(&mut self, lex_state: LexStateId) {
        self.starting_state = lex_state;
        if !self.lookahead_ready {
            self.fill_lookahead();
        }
    }

    /// Marks the start of the token in progress; everything between the end
    /// of the previous token and here becomes the new token's padding.
    pub fn start_token(&mut self) {
        self.token_start_position = self.current_position;
    }

    /// The character at the current position, or `None` at end of input.
    #[inline]
    pub fn lookahead(&self) -> Option<char> {
        self.lookahead
    }

    /// `true` once the whole input has been consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.lookahead_ready && self.lookahead.is_none()
    }

    /// Consumes the lookahead character. Returns `false` at end of input.
    pub fn advance(&mut self) -> bool {
        if !self.lookahead_ready {
            self.fill_lookahead();
        }
        let Some(ch) = self.lookahead else {
            return false;
        };
        self.current_position.bytes += TextSize::new(self.lookahead_bytes);
        self.current_position.chars += 1;
        if ch == '\n' {
            self.current_position.extent.row += 1;
            self.current_position.extent.column = 0;
        } else {
            self.current_position.extent.column += 1;
        }
        self.fill_lookahead();
        true
    }

    /// Finishes the token in progress as a leaf of `symbol`.
    ///
    /// `state_sensitive` records the lexer start state on the leaf, marking
    /// that the token may only be reused where the same lex state applies.
    pub fn accept(&mut self, symbol: Symbol, metadata: SymbolMetadata, state_sensitive: bool) -> Tree {
        let size = self.current_position - self.token_start_position;
        let padding = self.token_start_position - self.token_end_position;
        self.token_end_position = self.current_position;

        let mut tree = Tree::leaf(symbol, padding, size, metadata);
        if state_sensitive {
            tree.make_mut().lex_state = Some(self.starting_state);
        }
        tree
    }

    /// Finishes the token in progress as the end-of-input leaf.
    pub fn accept_end(&mut self) -> Tree {
        let metadata = SymbolMetadata {
            visible:    false,
            named:      false,
            structural: true,
        };
        self.accept(Symbol::END, metadata, false)
    }

    /// Finishes the token in progress as a lexer-error leaf, recording the
    /// character the lexer stopped on.
    pub fn accept_error(&mut self) -> Tree {
        let size = self.current_position - self.token_start_position;
        let padding = self.token_start_position - self.token_end_position;
        self.token_end_position = self.current_position;
        Tree::error_leaf(size, padding, self.lookahead)
    }

    fn fill_lookahead(&mut self) {
        self.lookahead = None;
        self.lookahead_bytes = 0;
        self.lookahead_ready = true;

        let Some(input) = self.input.as_mut() else {
            return;
        };
        if self.needs_seek {
            input.seek(self.current_position.chars, self.current_position.bytes);
            self.needs_seek = false;
            self.chunk.clear();
            self.chunk_start = u32::from(self.current_position.bytes);
        }
        let encoding = input.encoding();

        loop {
            let offset = (u32::from(self.current_position.bytes) - self.chunk_start) as usize;
            if offset >= self.chunk.len() {
                // Drop consumed bytes rather than growing forever.
                self.chunk_start += self.chunk.len() as u32;
                self.chunk.clear();
                let next = input.read();
                if next.is_empty() {
                    return;
                }
                self.chunk.extend_from_slice(next);
                continue;
            }
            match decode(&self.chunk[offset..], encoding) {
                Decoded::Char(ch, len) => {
                    self.lookahead = Some(ch);
                    self.lookahead_bytes = len;
                    return;
                }
                Decoded::Invalid(len) => {
                    self.lookahead = Some(char::REPLACEMENT_CHARACTER);
                    self.lookahead_bytes = len;
                    return;
                }
                Decoded::Incomplete => {
                    let next = input.read();
                    if next.is_empty() {
                        // Truncated trailing sequence: consume what is left.
                        self.lookahead = Some(char::REPLACEMENT_CHARACTER);
                        self.lookahead_bytes = (self.chunk.len() - offset) as u32;
                        return;
                    }
                    let next = next.to_vec();
                    self.chunk.extend_from_slice(&next);
                }
            }
        }
    }
}
