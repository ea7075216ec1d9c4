// SPDX-License-Identifier: MIT
//
// Output buffering and the stateful escape encoder.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer — accumulates all output bytes in memory so an entire
//   frame reaches the terminal in a single write() syscall.
//
//   CellWriter — remembers the last (fg, bg) pair and the last cursor
//   position it emitted, and skips whatever the terminal already has.
//   A run of same-styled cells on one row costs exactly one SGR, one
//   cursor move, and the characters; the terminal's own cursor advance
//   does the rest.
//
// The writer knows nothing about any particular terminal: every escape
// it emits comes from the capability table it is handed.

use std::io::{self, Write};

use crate::caps::Capabilities;
use crate::cell::{Attr, Style};
use crate::utf8;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates frame output for a single `write()`.
///
/// Default capacity: 16 KB — enough for most frames without
/// reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for tests and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a capability string verbatim.
    #[inline]
    pub fn put_cap(&mut self, cap: &str) {
        self.buf.extend_from_slice(cap.as_bytes());
    }

    /// Append a Unicode scalar as UTF-8.
    pub fn put_scalar(&mut self, cp: u32) {
        let mut enc = [0u8; utf8::MAX_LEN];
        let len = utf8::encode(cp, &mut enc);
        self.buf.extend_from_slice(&enc[..len]);
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w`, flush it, and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing happens via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Stateful escape encoder that skips redundant output.
///
/// Tracks what the terminal last received:
///
/// - **Style**: a new SGR is emitted only when the (fg, bg) descriptor
///   pair changes. The emission is reset-then-set — SGR reset, the
///   color-pair template, then bold when the fg BOLD bit is set and
///   blink when the bg BOLD bit is set.
/// - **Cursor**: a move is emitted only when the target is not the cell
///   immediately right of the last one written — the terminal advanced
///   there on its own.
///
/// Fresh (or [`reset_state`](Self::reset_state)ed) writers have no
/// tracked state, so the first emission always produces a full SGR and
/// an explicit move.
pub struct CellWriter {
    last_pair: Option<(Style, Style)>,
    last_x: i32,
    last_y: i32,
}

impl CellWriter {
    /// A writer with no tracked state.
    #[must_use]
    pub const fn new() -> Self {
        // -2 can never be one-left of a real column (those start at 0),
        // so the first send_char always emits a move.
        Self {
            last_pair: None,
            last_x: -2,
            last_y: -2,
        }
    }

    /// Forget all tracked state. Call after anything that touches the
    /// terminal behind the writer's back (a screen clear, a redraw).
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Emit the SGR sequences for a style pair, if it differs from the
    /// last one sent.
    pub fn send_style(&mut self, out: &mut OutputBuffer, caps: &Capabilities, fg: Style, bg: Style) {
        if self.last_pair == Some((fg, bg)) {
            return;
        }
        out.put_cap(caps.sgr_reset);
        caps.sgr
            .expand(out, u32::from(fg.color()), u32::from(bg.color()))
            .ok();
        if fg.has(Attr::BOLD) {
            out.put_cap(caps.bold);
        }
        // The BOLD bit on a background descriptor selects blink.
        if bg.has(Attr::BOLD) {
            out.put_cap(caps.blink);
        }
        self.last_pair = Some((fg, bg));
    }

    /// Emit one character at `(x, y)`, moving the cursor only when the
    /// terminal's auto-advance has not already put it there.
    pub fn send_char(&mut self, out: &mut OutputBuffer, caps: &Capabilities, x: u16, y: u16, ch: u32) {
        let (xi, yi) = (i32::from(x), i32::from(y));
        if yi != self.last_y || xi != self.last_x + 1 {
            caps.move_cursor
                .expand(out, u32::from(y) + 1, u32::from(x) + 1)
                .ok();
        }
        self.last_x = xi;
        self.last_y = yi;
        out.put_scalar(ch);
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn xterm() -> &'static Capabilities {
        Capabilities::by_name("xterm").unwrap()
    }

    /// Helper: render a cell sequence and return the output as a string.
    fn emit(cells: &[(u16, u16, char, Style, Style)]) -> String {
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        for &(x, y, ch, fg, bg) in cells {
            writer.send_style(&mut out, xterm(), fg, bg);
            writer.send_char(&mut out, xterm(), x, y, ch as u32);
        }
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn output_buffer_new_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn output_buffer_write_trait() {
        let mut buf = OutputBuffer::new();
        write!(buf, "frame {}", 42).unwrap();
        assert_eq!(buf.as_bytes(), b"frame 42");
    }

    #[test]
    fn put_scalar_ascii() {
        let mut buf = OutputBuffer::new();
        buf.put_scalar(u32::from('A'));
        assert_eq!(buf.as_bytes(), b"A");
    }

    #[test]
    fn put_scalar_multibyte() {
        let mut buf = OutputBuffer::new();
        buf.put_scalar(u32::from('中'));
        assert_eq!(buf.as_bytes(), "中".as_bytes());
    }

    #[test]
    fn put_cap_appends_verbatim() {
        let mut buf = OutputBuffer::new();
        buf.put_cap("\x1b[m");
        buf.put_cap("");
        assert_eq!(buf.as_bytes(), b"\x1b[m");
    }

    #[test]
    fn flush_to_drains_the_buffer() {
        let mut buf = OutputBuffer::new();
        buf.put_cap("data");
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"data");
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_to_empty_is_noop() {
        let mut buf = OutputBuffer::new();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert!(dest.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buf = OutputBuffer::new();
        buf.put_cap("some bytes");
        let cap = buf.buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.buf.capacity(), cap);
    }

    // ── CellWriter: style ───────────────────────────────────────────────

    #[test]
    fn first_style_is_always_emitted() {
        let output = emit(&[(0, 0, 'A', Style::WHITE, Style::BLACK)]);
        assert!(output.contains("\x1b[37;40m"));
    }

    #[test]
    fn style_emission_is_reset_then_set() {
        let output = emit(&[(0, 0, 'A', Style::RED, Style::BLACK)]);
        let reset_at = output.find("\x1b(B\x1b[m").unwrap();
        let sgr_at = output.find("\x1b[31;40m").unwrap();
        assert!(reset_at < sgr_at);
    }

    #[test]
    fn unchanged_pair_is_not_re_emitted() {
        let output = emit(&[
            (0, 0, 'A', Style::RED, Style::BLACK),
            (1, 0, 'B', Style::RED, Style::BLACK),
        ]);
        assert_eq!(output.matches("\x1b[31;40m").count(), 1);
    }

    #[test]
    fn changed_fg_re_emits() {
        let output = emit(&[
            (0, 0, 'A', Style::RED, Style::BLACK),
            (1, 0, 'B', Style::GREEN, Style::BLACK),
        ]);
        assert!(output.contains("\x1b[31;40m"));
        assert!(output.contains("\x1b[32;40m"));
    }

    #[test]
    fn changed_bg_re_emits() {
        let output = emit(&[
            (0, 0, 'A', Style::WHITE, Style::BLUE),
            (1, 0, 'B', Style::WHITE, Style::CYAN),
        ]);
        assert!(output.contains("\x1b[37;44m"));
        assert!(output.contains("\x1b[37;46m"));
    }

    #[test]
    fn attr_bit_change_re_emits() {
        // Same colors, different attributes: the pair differs bitwise.
        let output = emit(&[
            (0, 0, 'A', Style::WHITE, Style::BLACK),
            (1, 0, 'B', Style::WHITE | Attr::BOLD, Style::BLACK),
        ]);
        assert_eq!(output.matches("\x1b[37;40m").count(), 2);
    }

    #[test]
    fn fg_bold_bit_emits_bold() {
        let output = emit(&[(0, 0, 'A', Style::WHITE | Attr::BOLD, Style::BLACK)]);
        assert!(output.contains("\x1b[1m"));
        assert!(!output.contains("\x1b[5m"));
    }

    #[test]
    fn bg_bold_bit_emits_blink() {
        let output = emit(&[(0, 0, 'A', Style::WHITE, Style::BLACK | Attr::BOLD)]);
        assert!(output.contains("\x1b[5m"));
        assert!(!output.contains("\x1b[1m"));
    }

    #[test]
    fn underline_bit_changes_pair_but_emits_no_extra_cap() {
        // UNDERLINE participates in diffing (the pair differs) but the
        // encoder has no capability for it.
        let output = emit(&[(0, 0, 'A', Style::WHITE | Attr::UNDERLINE, Style::BLACK)]);
        assert!(output.contains("\x1b[37;40m"));
        assert!(!output.contains("\x1b[4m"));
    }

    // ── CellWriter: cursor ──────────────────────────────────────────────

    #[test]
    fn first_char_emits_cursor_move() {
        let output = emit(&[(5, 3, 'A', Style::WHITE, Style::BLACK)]);
        assert!(output.contains("\x1b[4;6H")); // 1-based row;col
    }

    #[test]
    fn sequential_cells_skip_cursor_moves() {
        let output = emit(&[
            (0, 0, 'H', Style::WHITE, Style::BLACK),
            (1, 0, 'i', Style::WHITE, Style::BLACK),
            (2, 0, '!', Style::WHITE, Style::BLACK),
        ]);
        assert_eq!(output.matches('H').count(), 2); // one move + the 'H' char
        assert!(output.ends_with("Hi!"));
    }

    #[test]
    fn gap_on_same_row_emits_move() {
        let output = emit(&[
            (0, 0, 'A', Style::WHITE, Style::BLACK),
            (5, 0, 'B', Style::WHITE, Style::BLACK),
        ]);
        assert!(output.contains("\x1b[1;1H"));
        assert!(output.contains("\x1b[1;6H"));
    }

    #[test]
    fn row_change_emits_move() {
        let output = emit(&[
            (0, 0, 'A', Style::WHITE, Style::BLACK),
            (1, 1, 'B', Style::WHITE, Style::BLACK),
        ]);
        assert!(output.contains("\x1b[1;1H"));
        assert!(output.contains("\x1b[2;2H"));
    }

    #[test]
    fn row_wrap_to_column_zero_emits_move() {
        // End of one row to start of the next: y differs, so a move is
        // emitted even though the terminal might have wrapped there.
        let output = emit(&[
            (9, 0, 'A', Style::WHITE, Style::BLACK),
            (0, 1, 'B', Style::WHITE, Style::BLACK),
        ]);
        assert!(output.contains("\x1b[2;1H"));
    }

    #[test]
    fn reset_state_forces_full_emission() {
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        writer.send_style(&mut out, xterm(), Style::WHITE, Style::BLACK);
        writer.send_char(&mut out, xterm(), 0, 0, u32::from('A'));

        out.clear();
        writer.reset_state();
        writer.send_style(&mut out, xterm(), Style::WHITE, Style::BLACK);
        writer.send_char(&mut out, xterm(), 1, 0, u32::from('B'));

        let output = String::from_utf8(out.as_bytes().to_vec()).unwrap();
        // Same pair and a sequential x, yet both re-emit after reset.
        assert!(output.contains("\x1b[37;40m"));
        assert!(output.contains("\x1b[1;2H"));
    }

    #[test]
    fn multibyte_char_output() {
        let output = emit(&[(0, 0, '中', Style::WHITE, Style::BLACK)]);
        assert!(output.ends_with('中'));
    }
}
