//! Positions and extents in the source text.
//!
//! Every tree node records two [`Length`]s: the `padding` that precedes its
//! content and the `size` of the content itself. A `Length` tracks three
//! coordinates at once -- characters, bytes and a row/column [`Point`] -- so
//! that hosts can address the tree in whichever unit their editor buffer
//! uses without re-scanning the text.

use std::ops::{Add, AddAssign, Sub, SubAssign};

use text_size::TextSize;

/// A row/column position or extent.
///
/// `row` counts newlines; `column` counts characters since the last newline.
/// Adding an extent that spans at least one row replaces the column instead
/// of accumulating it:
///
/// ```
/// # use larix::Point;
/// let a = Point::new(2, 7);
/// assert_eq!(a + Point::new(0, 3), Point::new(2, 10));
/// assert_eq!(a + Point::new(1, 3), Point::new(3, 3));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    /// Zero-based row.
    pub row:    u32,
    /// Zero-based column, in characters.
    pub column: u32,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point { row: 0, column: 0 };

    /// Creates a point from a row and a column.
    #[inline]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        if rhs.row == 0 {
            Point::new(self.row, self.column + rhs.column)
        } else {
            Point::new(self.row + rhs.row, rhs.column)
        }
    }
}

impl Sub for Point {
    type Output = Point;

    /// The extent from `rhs` to `self`.
    ///
    /// Only defined when `rhs` does not come after `self` in the document;
    /// checked in debug builds.
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        debug_assert!(rhs <= self, "point subtrahend must precede the minuend");
        if self.row == rhs.row {
            Point::new(0, self.column - rhs.column)
        } else {
            Point::new(self.row - rhs.row, self.column)
        }
    }
}

/// The distance covered by a span of text, or an absolute position when
/// measured from the start of the document.
///
/// Lengths form a commutative monoid under `+` with [`Length::ZERO`] as the
/// identity; `-` is defined when the subtrahend is a prefix of the minuend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Length {
    /// Characters covered.
    pub chars:  u32,
    /// Bytes covered, in the input's encoding.
    pub bytes:  TextSize,
    /// Rows and trailing columns covered.
    pub extent: Point,
}

impl Length {
    /// The empty length.
    pub const ZERO: Length = Length {
        chars:  0,
        bytes:  TextSize::new(0),
        extent: Point::ZERO,
    };

    /// Creates a length from its three coordinates.
    #[inline]
    pub const fn new(chars: u32, bytes: TextSize, extent: Point) -> Self {
        Self { chars, bytes, extent }
    }

    /// A length of `n` single-byte characters on one row.
    #[inline]
    pub fn of_chars(n: u32) -> Self {
        Self::new(n, TextSize::new(n), Point::new(0, n))
    }

    /// `true` if this length covers no text.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.bytes == TextSize::new(0) && self.chars == 0
    }
}

impl Add for Length {
    type Output = Length;

    #[inline]
    fn add(self, rhs: Length) -> Length {
        Length {
            chars:  self.chars + rhs.chars,
            bytes:  self.bytes + rhs.bytes,
            extent: self.extent + rhs.extent,
        }
    }
}

impl AddAssign for Length {
    #[inline]
    fn add_assign(&mut self, rhs: Length) {
        *self = *self + rhs;
    }
}

impl Sub for Length {
    type Output = Length;

    #[inline]
    fn sub(self, rhs: Length) -> Length {
        debug_assert!(rhs.bytes <= self.bytes, "length subtrahend must be a prefix");
        Length {
            chars:  self.chars - rhs.chars,
            bytes:  self.bytes - rhs.bytes,
            extent: self.extent - rhs.extent,
        }
    }
}

impl SubAssign for Length {
    #[inline]
    fn sub_assign(&mut self, rhs: Length) {
        *self = *self - rhs;
    }
}
