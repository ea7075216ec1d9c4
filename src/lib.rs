// SPDX-License-Identifier: MIT
//
// termgrid — a cell-grid terminal display library.
//
// The terminal is modeled as a two-dimensional grid of character cells,
// each carrying a code point plus packed color/attribute descriptors.
// Applications paint into a back buffer; `present` diffs it against a
// front buffer mirroring the screen and emits only the cursor moves,
// attribute changes, and characters needed to reconcile the two.
// Keyboard input flows the other way: raw bytes from the TTY land in a
// ring buffer, out of which a parser extracts one key event at a time.
//
// This crate intentionally avoids terminal abstraction frameworks in
// favor of direct control: termios raw mode, a resolved capability
// table per terminal family, and an output encoder that skips every
// escape sequence the screen state makes redundant. Every byte sent to
// the terminal is accounted for.

pub mod buffer;
pub mod caps;
pub mod cell;
pub mod input;
pub mod output;
pub mod render;
pub mod ringbuf;
pub mod terminal;
pub mod utf8;
