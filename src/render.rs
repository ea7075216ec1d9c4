// SPDX-License-Identifier: MIT
//
// Differential renderer — reconciles the screen with the back buffer.
//
// Instead of repainting everything, present() compares the back buffer
// against the front buffer (the exact mirror of what the terminal
// shows) and emits escape output only for cells that differ. After the
// walk the front buffer has been updated in place, so the next present
// diffs against reality again.
//
// The per-frame pipeline:
//
//   1. The application mutates back-buffer cells.
//   2. present() walks both buffers row-major; unchanged rows are
//      skipped with a single slice comparison, unchanged cells with a
//      Cell equality check.
//   3. Changed cells go through the CellWriter, which drops every
//      escape the terminal state makes redundant.
//   4. The caller flushes the accumulated bytes in one write().

use std::io::{self, Write};

use crate::buffer::CellBuffer;
use crate::caps::Capabilities;
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from one present pass, for profiling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed and were emitted.
    pub cells_drawn: usize,
    /// Cells that matched the front buffer and were skipped.
    pub cells_skipped: usize,
    /// Bytes of escape output generated.
    pub bytes: usize,
}

impl RenderStats {
    /// Total cells visited (`drawn + skipped`).
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_drawn + self.cells_skipped
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// The diff-and-emit engine between a back and a front buffer.
///
/// ```
/// use termgrid::buffer::CellBuffer;
/// use termgrid::caps::Capabilities;
/// use termgrid::cell::Cell;
/// use termgrid::render::Renderer;
///
/// let caps = Capabilities::by_name("xterm").unwrap();
/// let mut renderer = Renderer::new();
/// let mut back = CellBuffer::new(10, 3);
/// let mut front = CellBuffer::new(10, 3);
///
/// back.set(2, 1, Cell::new('A'));
/// let stats = renderer.present(&back, &mut front, caps);
/// assert_eq!(stats.cells_drawn, 1);
/// assert_eq!(front, back);
/// ```
pub struct Renderer {
    output: OutputBuffer,
    writer: CellWriter,
}

impl Renderer {
    /// Create a renderer with no tracked terminal state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
        }
    }

    /// Diff `back` against `front`, emit the difference, and update
    /// `front` to equal `back`.
    ///
    /// The buffers must have the same dimensions — the session resizes
    /// them in lockstep. Output accumulates internally; flush it with
    /// [`flush_to`](Self::flush_to) or inspect it with
    /// [`output_bytes`](Self::output_bytes).
    pub fn present(
        &mut self,
        back: &CellBuffer,
        front: &mut CellBuffer,
        caps: &Capabilities,
    ) -> RenderStats {
        debug_assert_eq!(back.width(), front.width());
        debug_assert_eq!(back.height(), front.height());

        self.output.clear();
        let mut stats = RenderStats::default();

        let width = back.width().min(front.width());
        let height = back.height().min(front.height());

        for y in 0..height {
            // Whole-row skip: one slice comparison instead of
            // cell-by-cell checks on untouched rows.
            if let (Some(back_row), Some(front_row)) = (back.row(y), front.row(y)) {
                if back_row == front_row {
                    stats.cells_skipped += usize::from(width);
                    continue;
                }
            }

            for x in 0..width {
                // In bounds by construction: x < width, y < height.
                let cell = *back.get(x, y).unwrap();
                if front.get(x, y) == Some(&cell) {
                    stats.cells_skipped += 1;
                    continue;
                }

                self.writer.send_style(&mut self.output, caps, cell.fg, cell.bg);
                self.writer.send_char(&mut self.output, caps, x, y, cell.ch);
                front.set(x, y, cell);
                stats.cells_drawn += 1;
            }
        }

        stats.bytes = self.output.len();
        stats
    }

    /// Forget the tracked terminal state so the next present emits a
    /// fresh SGR and cursor move for its first cell.
    ///
    /// Call after anything that touches the screen outside the diff
    /// model — a clear, a resize redraw.
    pub fn force_redraw(&mut self) {
        self.writer.reset_state();
    }

    /// The raw escape bytes from the last present (for tests).
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Write the accumulated output to `w` and clear it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }

    /// Direct access to the output accumulator, for session code that
    /// needs to emit outside the diff loop (screen clears).
    pub(crate) fn output_mut(&mut self) -> &mut OutputBuffer {
        &mut self.output
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
