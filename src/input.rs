// SPDX-License-Identifier: MIT
//
// Keyboard input parsing.
//
// Turns the raw bytes buffered in the ring into key events, one event
// per call. Three byte shapes exist on a terminal's keyboard stream:
//
// - Escape-prefixed key sequences (arrows, function keys, editing
//   keys), matched against the capability table of the running
//   terminal.
// - Control bytes (0x00–0x1F and 0x7F), surfaced as control keys.
// - UTF-8 characters, decoded into printable character events.
//
// A bare ESC byte is ambiguous: Escape keypress, or the head of a
// sequence the table does not know? The input mode decides. ESC mode
// surfaces the Escape immediately and lets following bytes become their
// own events. ALT mode reads ESC as a Meta prefix: the next byte's
// event is delivered with the alt flag set.
//
// The parser peeks before it discards, so a truncated UTF-8 character
// (or, in ALT mode, a lone ESC) stays in the ring untouched until the
// rest of it arrives.

use crate::caps::Capabilities;
use crate::ringbuf::RingBuf;
use crate::utf8;

// ─── Key Identity ────────────────────────────────────────────────────────────

/// Identity of one key.
///
/// Printable characters use [`Char`](KeyCode::Char); control bytes use
/// [`Ctrl`](KeyCode::Ctrl) with the raw byte value; everything the
/// terminal encodes as an escape sequence has a named variant. The
/// associated constants name the control bytes applications usually
/// match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable Unicode character.
    Char(char),
    /// A control byte: 0x00–0x1F or 0x7F.
    Ctrl(u8),
    /// Function keys F1 through F12.
    F(u8),
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl KeyCode {
    /// Carriage return, the Enter key.
    pub const ENTER: Self = Self::Ctrl(0x0D);
    /// Horizontal tab.
    pub const TAB: Self = Self::Ctrl(0x09);
    /// The Escape key.
    pub const ESC: Self = Self::Ctrl(0x1B);
    /// Backspace as 0x08 (Ctrl-H).
    pub const BACKSPACE: Self = Self::Ctrl(0x08);
    /// Backspace as 0x7F, the more common modern encoding.
    pub const BACKSPACE2: Self = Self::Ctrl(0x7F);

    /// The stable 16-bit code of a non-character key.
    ///
    /// Control keys sit at their byte value; named keys count down from
    /// 0xFFFF, far above any printable code point, so the two ranges
    /// never collide. `Char` keys have no code — their identity is the
    /// character itself.
    #[must_use]
    pub const fn code(self) -> Option<u16> {
        match self {
            Self::Char(_) => None,
            Self::Ctrl(b) => Some(b as u16),
            Self::F(n) => Some(0xFFFF - (n as u16 - 1)),
            Self::Insert => Some(0xFFFF - 12),
            Self::Delete => Some(0xFFFF - 13),
            Self::Home => Some(0xFFFF - 14),
            Self::End => Some(0xFFFF - 15),
            Self::PageUp => Some(0xFFFF - 16),
            Self::PageDown => Some(0xFFFF - 17),
            Self::Up => Some(0xFFFF - 18),
            Self::Down => Some(0xFFFF - 19),
            Self::Left => Some(0xFFFF - 20),
            Self::Right => Some(0xFFFF - 21),
        }
    }
}

/// One delivered unit of keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key.
    pub code: KeyCode,
    /// Whether the Alt (Meta) prefix accompanied it.
    pub alt: bool,
}

impl KeyEvent {
    /// A plain event with no modifier.
    #[inline]
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self { code, alt: false }
    }

    /// The same event with the alt flag set.
    #[inline]
    #[must_use]
    pub const fn with_alt(self) -> Self {
        Self { alt: true, ..self }
    }
}

/// How the parser resolves a bare ESC byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Surface ESC immediately as an Escape keypress.
    #[default]
    Esc,
    /// Treat ESC as a Meta prefix for the following byte.
    Alt,
}

// ─── Event Extraction ────────────────────────────────────────────────────────

/// Largest byte window the parser ever has to inspect: the longest
/// capability sequence and the longest UTF-8 form both fit well inside.
const PEEK_WINDOW: usize = 16;

/// Extract one key event from the oldest bytes in the ring.
///
/// Returns `None` when the buffered bytes do not yet form a complete
/// event — the caller should read more input and try again. Consumed
/// bytes are discarded from the ring; bytes of an incomplete event are
/// left in place.
#[must_use]
pub fn extract_event(
    ring: &mut RingBuf,
    caps: &Capabilities,
    mode: InputMode,
) -> Option<KeyEvent> {
    let mut window = [0u8; PEEK_WINDOW];
    let n = ring.peek(&mut window);
    if n == 0 {
        return None;
    }
    let head = &window[..n];

    // ── Escape-prefixed input ──
    if head[0] == 0x1B {
        for (seq, key) in caps.keys {
            if head.starts_with(seq.as_bytes()) {
                ring.discard(seq.len());
                return Some(KeyEvent::new(*key));
            }
        }
        return match mode {
            InputMode::Esc => {
                ring.discard(1);
                Some(KeyEvent::new(KeyCode::ESC))
            }
            InputMode::Alt => extract_alt(ring, head),
        };
    }

    // ── Control bytes ──
    if head[0] < 0x20 || head[0] == 0x7F {
        ring.discard(1);
        return Some(KeyEvent::new(KeyCode::Ctrl(head[0])));
    }

    // ── UTF-8 character ──
    let (cp, len) = utf8::decode(head)?;
    ring.discard(len);
    Some(KeyEvent::new(KeyCode::Char(scalar_to_char(cp))))
}

/// ALT-mode handling of an ESC that matched no key sequence: deliver
/// the *following* byte's event with the alt flag set.
fn extract_alt(ring: &mut RingBuf, head: &[u8]) -> Option<KeyEvent> {
    if head.len() < 2 {
        // Only the ESC is buffered; the prefixed key may still arrive.
        return None;
    }

    let b = head[1];
    if b == 0x1B {
        // ESC ESC: surface one Escape and leave the second for the
        // next extraction.
        ring.discard(1);
        return Some(KeyEvent::new(KeyCode::ESC));
    }
    if b < 0x20 || b == 0x7F {
        ring.discard(2);
        return Some(KeyEvent::new(KeyCode::Ctrl(b)).with_alt());
    }

    let (cp, len) = utf8::decode(&head[1..])?;
    ring.discard(1 + len);
    Some(KeyEvent::new(KeyCode::Char(scalar_to_char(cp))).with_alt())
}

/// Clamp a decoded scalar to a `char`, replacing invalid values.
fn scalar_to_char(cp: u32) -> char {
    char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
