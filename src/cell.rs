// SPDX-License-Identifier: MIT
//
// Cell — the atomic unit of the terminal grid.
//
// Every character position on screen is a Cell: a Unicode scalar plus a
// foreground and a background descriptor. A descriptor packs a color
// index in its low nibble and attribute bits above it, so the whole
// cell is 8 bytes, Copy, and compares with a single derived PartialEq.
// The entire rendering pipeline exists to produce, diff, and output
// these.
//
// The same attribute bit means different things on the two descriptors:
// BOLD on the foreground selects the bold capability, BOLD on the
// background selects blink. That is how the wire protocol multiplexes
// two effects through one bit position, and the encoder honors it.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// ─── Attributes ──────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Attribute bits of a style descriptor.
    ///
    /// These occupy the bits above the 4-bit color nibble and combine
    /// with a color by bitwise OR:
    ///
    /// ```
    /// use termgrid::cell::{Attr, Style};
    ///
    /// let style = Style::RED | Attr::BOLD;
    /// assert_eq!(style.color(), Style::RED.color());
    /// assert!(style.has(Attr::BOLD));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u16 {
        /// Increased intensity on a foreground; blink on a background.
        const BOLD      = 0x10;
        /// Underlined text.
        const UNDERLINE = 0x20;
        /// Blinking text.
        const BLINK     = 0x40;
    }
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// A packed 16-bit color + attribute descriptor.
///
/// Low nibble: one of the eight basic color indices. Upper bits: [`Attr`]
/// flags. Cells carry one `Style` for the foreground and one for the
/// background.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style(u16);

impl Style {
    /// Color index 0.
    pub const BLACK: Self = Self(0x00);
    /// Color index 1.
    pub const RED: Self = Self(0x01);
    /// Color index 2.
    pub const GREEN: Self = Self(0x02);
    /// Color index 3.
    pub const YELLOW: Self = Self(0x03);
    /// Color index 4.
    pub const BLUE: Self = Self(0x04);
    /// Color index 5.
    pub const MAGENTA: Self = Self(0x05);
    /// Color index 6.
    pub const CYAN: Self = Self(0x06);
    /// Color index 7.
    pub const WHITE: Self = Self(0x07);

    /// Reconstruct a descriptor from its raw bit pattern.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw bit pattern.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The color index in the low nibble (0–7 for the basic palette).
    #[inline]
    #[must_use]
    pub const fn color(self) -> u16 {
        self.0 & 0x0F
    }

    /// The attribute bits, stripped of the color nibble.
    #[inline]
    #[must_use]
    pub const fn attrs(self) -> Attr {
        Attr::from_bits_truncate(self.0 & !0x0F)
    }

    /// Whether every bit of `attr` is set on this descriptor.
    #[inline]
    #[must_use]
    pub const fn has(self, attr: Attr) -> bool {
        self.0 & attr.bits() == attr.bits()
    }

    /// This descriptor with `attr` added (const-context [`BitOr`]).
    #[inline]
    #[must_use]
    pub const fn with(self, attr: Attr) -> Self {
        Self(self.0 | attr.bits())
    }
}

impl BitOr<Attr> for Style {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Attr) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign<Attr> for Style {
    #[inline]
    fn bitor_assign(&mut self, rhs: Attr) {
        *self = self.with(rhs);
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 8] = [
            "Black", "Red", "Green", "Yellow", "Blue", "Magenta", "Cyan", "White",
        ];
        match NAMES.get(self.color() as usize) {
            Some(name) => write!(f, "Style({name}")?,
            None => write!(f, "Style({:#x}", self.color())?,
        }
        if !self.attrs().is_empty() {
            write!(f, " | {:?}", self.attrs())?;
        }
        write!(f, ")")
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// Default character for empty cells.
const SPACE: u32 = b' ' as u32;

/// A single terminal cell — the atom of rendering.
///
/// # Layout (8 bytes)
///
/// ```text
/// ┌──────────┬───────────┬───────────┐
/// │ ch: u32  │ fg: Style │ bg: Style │
/// │ 4 bytes  │  2 bytes  │  2 bytes  │
/// └──────────┴───────────┴───────────┘
/// ```
///
/// Two cells are equal exactly when all three fields are bitwise equal;
/// that equality is what the diff renderer runs on.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Unicode scalar to display.
    pub ch: u32,
    /// Foreground (text) descriptor.
    pub fg: Style,
    /// Background descriptor.
    pub bg: Style,
}

impl Cell {
    /// The default cell: space, white on black, no attributes.
    pub const DEFAULT: Self = Self {
        ch: SPACE,
        fg: Style::WHITE,
        bg: Style::BLACK,
    };

    /// Create a cell with a character and default styling.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: ch as u32,
            fg: Style::WHITE,
            bg: Style::BLACK,
        }
    }

    /// Create a fully styled cell.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: Style, bg: Style) -> Self {
        Self {
            ch: ch as u32,
            fg,
            bg,
        }
    }

    /// The scalar as a `char`, when it is a valid one.
    #[inline]
    #[must_use]
    pub const fn character(self) -> Option<char> {
        char::from_u32(self.ch)
    }

    /// This cell with a different foreground.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Style) -> Self {
        Self { fg, ..self }
    }

    /// This cell with a different background.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Style) -> Self {
        Self { bg, ..self }
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match char::from_u32(self.ch) {
            Some(ch) => write!(f, "Cell({ch:?}")?,
            None => write!(f, "Cell({:#x}", self.ch)?,
        }
        if self.fg != Style::WHITE {
            write!(f, ", fg={:?}", self.fg)?;
        }
        if self.bg != Style::BLACK {
            write!(f, ", bg={:?}", self.bg)?;
        }
        write!(f, ")")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    // ── Layout ───────────────────────────────────────────────────────────

    #[test]
    fn cell_is_8_bytes() {
        assert_eq!(mem::size_of::<Cell>(), 8);
    }

    #[test]
    fn style_is_2_bytes() {
        assert_eq!(mem::size_of::<Style>(), 2);
    }

    #[test]
    fn cell_is_copy() {
        let a = Cell::DEFAULT;
        let b = a; // Copy, not move
        assert_eq!(a, b);
    }

    // ── Style ────────────────────────────────────────────────────────────

    #[test]
    fn color_constants_are_the_basic_palette() {
        let palette = [
            Style::BLACK,
            Style::RED,
            Style::GREEN,
            Style::YELLOW,
            Style::BLUE,
            Style::MAGENTA,
            Style::CYAN,
            Style::WHITE,
        ];
        for (i, style) in palette.iter().enumerate() {
            assert_eq!(style.color(), i as u16);
            assert!(style.attrs().is_empty());
        }
    }

    #[test]
    fn attrs_occupy_high_bits() {
        assert_eq!(Attr::BOLD.bits(), 0x10);
        assert_eq!(Attr::UNDERLINE.bits(), 0x20);
        assert_eq!(Attr::BLINK.bits(), 0x40);
    }

    #[test]
    fn or_combines_color_and_attrs() {
        let style = Style::RED | Attr::BOLD | Attr::UNDERLINE;
        assert_eq!(style.color(), 1);
        assert!(style.has(Attr::BOLD));
        assert!(style.has(Attr::UNDERLINE));
        assert!(!style.has(Attr::BLINK));
        assert_eq!(style.bits(), 0x31);
    }

    #[test]
    fn or_assign() {
        let mut style = Style::GREEN;
        style |= Attr::BLINK;
        assert!(style.has(Attr::BLINK));
        assert_eq!(style.color(), 2);
    }

    #[test]
    fn attrs_strip_color_nibble() {
        let style = Style::WHITE | Attr::BOLD;
        assert_eq!(style.attrs(), Attr::BOLD);
    }

    #[test]
    fn has_requires_all_bits() {
        let style = Style::BLUE | Attr::BOLD;
        assert!(style.has(Attr::BOLD));
        assert!(!style.has(Attr::BOLD | Attr::BLINK));
    }

    #[test]
    fn bits_round_trip() {
        let style = Style::CYAN | Attr::UNDERLINE;
        assert_eq!(Style::from_bits(style.bits()), style);
    }

    #[test]
    fn style_debug_names_color() {
        assert_eq!(format!("{:?}", Style::MAGENTA), "Style(Magenta)");
        let styled = format!("{:?}", Style::RED | Attr::BOLD);
        assert!(styled.contains("Red"));
        assert!(styled.contains("BOLD"));
    }

    // ── Default Cell ─────────────────────────────────────────────────────

    #[test]
    fn default_cell_is_space_white_on_black() {
        let cell = Cell::default();
        assert_eq!(cell.ch, u32::from(b' '));
        assert_eq!(cell.fg, Style::WHITE);
        assert_eq!(cell.bg, Style::BLACK);
        assert_eq!(cell, Cell::DEFAULT);
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn new_cell_has_default_styling() {
        let cell = Cell::new('A');
        assert_eq!(cell.character(), Some('A'));
        assert_eq!(cell.fg, Style::WHITE);
        assert_eq!(cell.bg, Style::BLACK);
    }

    #[test]
    fn styled_cell_keeps_all_fields() {
        let cell = Cell::styled('Z', Style::YELLOW | Attr::BOLD, Style::BLUE);
        assert_eq!(cell.character(), Some('Z'));
        assert_eq!(cell.fg.color(), 3);
        assert!(cell.fg.has(Attr::BOLD));
        assert_eq!(cell.bg, Style::BLUE);
    }

    #[test]
    fn unicode_cell() {
        let cell = Cell::new('日');
        assert_eq!(cell.character(), Some('日'));
    }

    #[test]
    fn builder_chain() {
        let cell = Cell::new('x').with_fg(Style::GREEN).with_bg(Style::RED);
        assert_eq!(cell.fg, Style::GREEN);
        assert_eq!(cell.bg, Style::RED);
        assert_eq!(cell.character(), Some('x'));
    }

    // ── Equality ─────────────────────────────────────────────────────────

    #[test]
    fn cells_differ_by_character() {
        assert_ne!(Cell::new('A'), Cell::new('B'));
    }

    #[test]
    fn cells_differ_by_fg_attr_only() {
        let plain = Cell::new('A');
        let bold = Cell::new('A').with_fg(Style::WHITE | Attr::BOLD);
        assert_ne!(plain, bold);
    }

    #[test]
    fn cells_differ_by_bg() {
        let a = Cell::new('A').with_bg(Style::BLUE);
        let b = Cell::new('A').with_bg(Style::CYAN);
        assert_ne!(a, b);
    }

    // ── Debug ────────────────────────────────────────────────────────────

    #[test]
    fn debug_default_cell() {
        assert_eq!(format!("{:?}", Cell::DEFAULT), "Cell(' ')");
    }

    #[test]
    fn debug_styled_cell() {
        let cell = Cell::styled('A', Style::RED | Attr::BOLD, Style::BLUE);
        let dbg = format!("{cell:?}");
        assert!(dbg.contains("'A'"));
        assert!(dbg.contains("fg="));
        assert!(dbg.contains("bg="));
    }
}
