// SPDX-License-Identifier: MIT
//
// Resolved terminal capabilities.
//
// The escape-sequence dialects of the terminal families this library
// supports, resolved to plain strings. One table per family: the mode
// switches and clears are fixed strings, the two parameterized
// capabilities (SGR color pair, cursor move) are prefix/separator/
// suffix templates, and each table carries the family's input key
// sequences mapped to logical key codes.
//
// The rest of the crate consumes these tables and nothing else — the
// encoder does not know what terminal it is driving, and the input
// parser matches whatever sequences the table advertises. Selection
// happens once, at startup, from `$TERM`.

use std::io::{self, Write};

use crate::input::KeyCode;

// ─── Parameterized Capabilities ──────────────────────────────────────────────

/// A two-parameter escape template: `prefix A sep B suffix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamCap {
    prefix: &'static str,
    sep: &'static str,
    suffix: &'static str,
}

impl ParamCap {
    const fn new(prefix: &'static str, sep: &'static str, suffix: &'static str) -> Self {
        Self { prefix, sep, suffix }
    }

    /// Expand the template with both parameters into `w`.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `w`.
    #[inline]
    pub fn expand(&self, w: &mut impl Write, a: u32, b: u32) -> io::Result<()> {
        write!(w, "{}{a}{}{b}{}", self.prefix, self.sep, self.suffix)
    }
}

// ─── Capabilities ────────────────────────────────────────────────────────────

/// The resolved capability strings of one terminal family.
pub struct Capabilities {
    /// Family name as it appears in `$TERM`.
    pub name: &'static str,
    /// Enter the alternate screen (CA mode).
    pub enter_ca: &'static str,
    /// Leave the alternate screen.
    pub exit_ca: &'static str,
    /// Enter keypad transmit mode.
    pub enter_keypad: &'static str,
    /// Leave keypad transmit mode.
    pub exit_keypad: &'static str,
    /// Make the cursor visible.
    pub show_cursor: &'static str,
    /// Hide the cursor.
    pub hide_cursor: &'static str,
    /// Clear the whole screen.
    pub clear_screen: &'static str,
    /// Reset all SGR attributes to the terminal default.
    pub sgr_reset: &'static str,
    /// Bold (increased intensity).
    pub bold: &'static str,
    /// Blink.
    pub blink: &'static str,
    /// SGR color pair template: parameters are the fg and bg indices (0–7).
    pub sgr: ParamCap,
    /// Cursor move template: parameters are the 1-based row and column.
    pub move_cursor: ParamCap,
    /// Input key sequences in the order F1–F12, Insert, Delete, Home,
    /// End, `PgUp`, `PgDn`, Up, Down, Left, Right.
    pub keys: &'static [(&'static str, KeyCode)],
}

impl Capabilities {
    /// Resolve the capability table for `$TERM`.
    ///
    /// Returns `None` when the variable is unset or names a terminal
    /// this library has no table for — the caller treats that as an
    /// unsupported terminal.
    #[must_use]
    pub fn detect() -> Option<&'static Self> {
        let term = std::env::var("TERM").ok()?;
        Self::by_name(&term)
    }

    /// Resolve a capability table by terminal name.
    ///
    /// Exact family names match first; otherwise the name's family
    /// prefix decides (`xterm-256color` → `xterm`, `screen.xterm` →
    /// `screen`, `tmux-*` → `screen`, bare `rxvt` → `rxvt-256color`).
    #[must_use]
    pub fn by_name(term: &str) -> Option<&'static Self> {
        if let Some(caps) = TERMINALS.iter().find(|c| c.name == term) {
            return Some(caps);
        }
        if let Some(caps) = TERMINALS.iter().find(|c| term.starts_with(c.name)) {
            return Some(caps);
        }
        // Aliases that do not share their family's spelling.
        if term.starts_with("tmux") {
            return Some(&SCREEN);
        }
        if term.starts_with("rxvt") {
            return Some(&RXVT_256COLOR);
        }
        None
    }

    /// The byte sequence this terminal sends for `key`, if any.
    ///
    /// The reverse direction of the input parser's lookup.
    #[must_use]
    pub fn sequence_for(&self, key: KeyCode) -> Option<&'static str> {
        self.keys
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(seq, _)| *seq)
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Capabilities({})", self.name)
    }
}

/// Every built-in table, ordered so that prefix matching picks the most
/// specific family first (`rxvt-unicode-256color` must not land on
/// `rxvt-256color`).
static TERMINALS: [&Capabilities; 6] = [
    &RXVT_UNICODE,
    &RXVT_256COLOR,
    &ETERM,
    &SCREEN,
    &LINUX,
    &XTERM,
];

// ─── Key Sequence Tables ─────────────────────────────────────────────────────

static XTERM_KEYS: &[(&str, KeyCode)] = &[
    ("\x1bOP", KeyCode::F(1)),
    ("\x1bOQ", KeyCode::F(2)),
    ("\x1bOR", KeyCode::F(3)),
    ("\x1bOS", KeyCode::F(4)),
    ("\x1b[15~", KeyCode::F(5)),
    ("\x1b[17~", KeyCode::F(6)),
    ("\x1b[18~", KeyCode::F(7)),
    ("\x1b[19~", KeyCode::F(8)),
    ("\x1b[20~", KeyCode::F(9)),
    ("\x1b[21~", KeyCode::F(10)),
    ("\x1b[23~", KeyCode::F(11)),
    ("\x1b[24~", KeyCode::F(12)),
    ("\x1b[2~", KeyCode::Insert),
    ("\x1b[3~", KeyCode::Delete),
    ("\x1bOH", KeyCode::Home),
    ("\x1bOF", KeyCode::End),
    ("\x1b[5~", KeyCode::PageUp),
    ("\x1b[6~", KeyCode::PageDown),
    ("\x1bOA", KeyCode::Up),
    ("\x1bOB", KeyCode::Down),
    ("\x1bOD", KeyCode::Left),
    ("\x1bOC", KeyCode::Right),
];

static LINUX_KEYS: &[(&str, KeyCode)] = &[
    ("\x1b[[A", KeyCode::F(1)),
    ("\x1b[[B", KeyCode::F(2)),
    ("\x1b[[C", KeyCode::F(3)),
    ("\x1b[[D", KeyCode::F(4)),
    ("\x1b[[E", KeyCode::F(5)),
    ("\x1b[17~", KeyCode::F(6)),
    ("\x1b[18~", KeyCode::F(7)),
    ("\x1b[19~", KeyCode::F(8)),
    ("\x1b[20~", KeyCode::F(9)),
    ("\x1b[21~", KeyCode::F(10)),
    ("\x1b[23~", KeyCode::F(11)),
    ("\x1b[24~", KeyCode::F(12)),
    ("\x1b[2~", KeyCode::Insert),
    ("\x1b[3~", KeyCode::Delete),
    ("\x1b[1~", KeyCode::Home),
    ("\x1b[4~", KeyCode::End),
    ("\x1b[5~", KeyCode::PageUp),
    ("\x1b[6~", KeyCode::PageDown),
    ("\x1b[A", KeyCode::Up),
    ("\x1b[B", KeyCode::Down),
    ("\x1b[D", KeyCode::Left),
    ("\x1b[C", KeyCode::Right),
];

static SCREEN_KEYS: &[(&str, KeyCode)] = &[
    ("\x1bOP", KeyCode::F(1)),
    ("\x1bOQ", KeyCode::F(2)),
    ("\x1bOR", KeyCode::F(3)),
    ("\x1bOS", KeyCode::F(4)),
    ("\x1b[15~", KeyCode::F(5)),
    ("\x1b[17~", KeyCode::F(6)),
    ("\x1b[18~", KeyCode::F(7)),
    ("\x1b[19~", KeyCode::F(8)),
    ("\x1b[20~", KeyCode::F(9)),
    ("\x1b[21~", KeyCode::F(10)),
    ("\x1b[23~", KeyCode::F(11)),
    ("\x1b[24~", KeyCode::F(12)),
    ("\x1b[2~", KeyCode::Insert),
    ("\x1b[3~", KeyCode::Delete),
    ("\x1b[1~", KeyCode::Home),
    ("\x1b[4~", KeyCode::End),
    ("\x1b[5~", KeyCode::PageUp),
    ("\x1b[6~", KeyCode::PageDown),
    ("\x1bOA", KeyCode::Up),
    ("\x1bOB", KeyCode::Down),
    ("\x1bOD", KeyCode::Left),
    ("\x1bOC", KeyCode::Right),
];

/// Shared by rxvt-unicode, rxvt-256color, and Eterm — the whole family
/// sends the same key encoding.
static RXVT_KEYS: &[(&str, KeyCode)] = &[
    ("\x1b[11~", KeyCode::F(1)),
    ("\x1b[12~", KeyCode::F(2)),
    ("\x1b[13~", KeyCode::F(3)),
    ("\x1b[14~", KeyCode::F(4)),
    ("\x1b[15~", KeyCode::F(5)),
    ("\x1b[17~", KeyCode::F(6)),
    ("\x1b[18~", KeyCode::F(7)),
    ("\x1b[19~", KeyCode::F(8)),
    ("\x1b[20~", KeyCode::F(9)),
    ("\x1b[21~", KeyCode::F(10)),
    ("\x1b[23~", KeyCode::F(11)),
    ("\x1b[24~", KeyCode::F(12)),
    ("\x1b[2~", KeyCode::Insert),
    ("\x1b[3~", KeyCode::Delete),
    ("\x1b[7~", KeyCode::Home),
    ("\x1b[8~", KeyCode::End),
    ("\x1b[5~", KeyCode::PageUp),
    ("\x1b[6~", KeyCode::PageDown),
    ("\x1b[A", KeyCode::Up),
    ("\x1b[B", KeyCode::Down),
    ("\x1b[D", KeyCode::Left),
    ("\x1b[C", KeyCode::Right),
];

// ─── Terminal Tables ─────────────────────────────────────────────────────────

/// The ANSI SGR color-pair and cursor-move templates every supported
/// family shares (`ESC [ 3<fg> ; 4<bg> m` and `ESC [ <row> ; <col> H`).
const ANSI_SGR: ParamCap = ParamCap::new("\x1b[3", ";4", "m");
const ANSI_CUP: ParamCap = ParamCap::new("\x1b[", ";", "H");

static XTERM: Capabilities = Capabilities {
    name: "xterm",
    enter_ca: "\x1b[?1049h",
    exit_ca: "\x1b[?1049l",
    enter_keypad: "\x1b[?1h\x1b=",
    exit_keypad: "\x1b[?1l\x1b>",
    show_cursor: "\x1b[?12l\x1b[?25h",
    hide_cursor: "\x1b[?25l",
    clear_screen: "\x1b[H\x1b[2J",
    sgr_reset: "\x1b(B\x1b[m",
    bold: "\x1b[1m",
    blink: "\x1b[5m",
    sgr: ANSI_SGR,
    move_cursor: ANSI_CUP,
    keys: XTERM_KEYS,
};

static LINUX: Capabilities = Capabilities {
    name: "linux",
    enter_ca: "",
    exit_ca: "",
    enter_keypad: "",
    exit_keypad: "",
    show_cursor: "\x1b[?25h\x1b[?0c",
    hide_cursor: "\x1b[?25l\x1b[?1c",
    clear_screen: "\x1b[H\x1b[J",
    sgr_reset: "\x1b[0;10m",
    bold: "\x1b[1m",
    blink: "\x1b[5m",
    sgr: ANSI_SGR,
    move_cursor: ANSI_CUP,
    keys: LINUX_KEYS,
};

static SCREEN: Capabilities = Capabilities {
    name: "screen",
    enter_ca: "\x1b[?1049h",
    exit_ca: "\x1b[?1049l",
    enter_keypad: "\x1b[?1h\x1b=",
    exit_keypad: "\x1b[?1l\x1b>",
    show_cursor: "\x1b[34h\x1b[?25h",
    hide_cursor: "\x1b[?25l",
    clear_screen: "\x1b[H\x1b[J",
    sgr_reset: "\x1b[m",
    bold: "\x1b[1m",
    blink: "\x1b[5m",
    sgr: ANSI_SGR,
    move_cursor: ANSI_CUP,
    keys: SCREEN_KEYS,
};

static RXVT_UNICODE: Capabilities = Capabilities {
    name: "rxvt-unicode",
    enter_ca: "\x1b[?1049h",
    exit_ca: "\x1b[r\x1b[?1049l",
    enter_keypad: "\x1b=",
    exit_keypad: "\x1b>",
    show_cursor: "\x1b[?25h",
    hide_cursor: "\x1b[?25l",
    clear_screen: "\x1b[H\x1b[2J",
    sgr_reset: "\x1b[m\x1b(B",
    bold: "\x1b[1m",
    blink: "\x1b[5m",
    sgr: ANSI_SGR,
    move_cursor: ANSI_CUP,
    keys: RXVT_KEYS,
};

static RXVT_256COLOR: Capabilities = Capabilities {
    name: "rxvt-256color",
    enter_ca: "\x1b7\x1b[?47h",
    exit_ca: "\x1b[2J\x1b[?47l\x1b8",
    enter_keypad: "\x1b=",
    exit_keypad: "\x1b>",
    show_cursor: "\x1b[?25h",
    hide_cursor: "\x1b[?25l",
    clear_screen: "\x1b[H\x1b[2J",
    sgr_reset: "\x1b[m",
    bold: "\x1b[1m",
    blink: "\x1b[5m",
    sgr: ANSI_SGR,
    move_cursor: ANSI_CUP,
    keys: RXVT_KEYS,
};

static ETERM: Capabilities = Capabilities {
    name: "Eterm",
    enter_ca: "\x1b7\x1b[?47h",
    exit_ca: "\x1b[2J\x1b[?47l\x1b8",
    enter_keypad: "",
    exit_keypad: "",
    show_cursor: "\x1b[?25h",
    hide_cursor: "\x1b[?25l",
    clear_screen: "\x1b[H\x1b[2J",
    sgr_reset: "\x1b[m",
    bold: "\x1b[1m",
    blink: "\x1b[5m",
    sgr: ANSI_SGR,
    move_cursor: ANSI_CUP,
    keys: RXVT_KEYS,
};

// ─── Tests ───────────────────────────────────────────────────────────────────
