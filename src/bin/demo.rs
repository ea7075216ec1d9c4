// SPDX-License-Identifier: MIT
//
// termgrid demo — a live key-event viewer that wires every module
// together: raw-mode session, capability-matched input parsing, and
// diff-rendered output. Run it, press keys, resize the terminal.
// ESC quits.
//
// Usage:
//   cargo run --bin demo

use std::collections::VecDeque;
use std::process::ExitCode;
use std::time::Duration;

use termgrid::cell::{Attr, Style};
use termgrid::input::{KeyCode, KeyEvent};
use termgrid::terminal::{Error, Terminal};

/// Rows of event history kept for display.
const MAX_LOG_ENTRIES: usize = 64;

/// Redraw cadence while idle, so resizes are picked up promptly.
const IDLE_TICK: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let mut term = Terminal::init()?;

    let mut log: VecDeque<String> = VecDeque::with_capacity(MAX_LOG_ENTRIES);
    let mut event_count: u64 = 0;

    loop {
        draw(&mut term, &log, event_count)?;

        match term.peek_event(IDLE_TICK) {
            Ok(Some(event)) => {
                if event.code == KeyCode::ESC {
                    break;
                }
                event_count += 1;
                if log.len() >= MAX_LOG_ENTRIES {
                    log.pop_front();
                }
                log.push_back(describe(event));
            }
            Ok(None) => {} // idle tick: redraw to absorb pending resizes
            Err(Error::InputOverflow) => {
                log.push_back("input overflow, bytes dropped".into());
            }
            Err(err) => return Err(err),
        }
    }

    term.shutdown()?;
    Ok(())
}

fn draw(term: &mut Terminal, log: &VecDeque<String>, event_count: u64) -> Result<(), Error> {
    term.clear()?;
    let w = term.width();
    let h = term.height();
    if w < 20 || h < 4 {
        term.present()?;
        return Ok(());
    }

    // ── Header bar ───────────────────────────────────────────────
    for x in 0..w {
        term.change_cell(x, 0, ' ', Style::BLACK, Style::CYAN);
    }
    let title = format!(" termgrid demo | {w}x{h} | {event_count} events | ESC quits ");
    put_str(term, 0, 0, &title, Style::BLACK | Attr::BOLD, Style::CYAN);

    // ── Event log, newest at the bottom ──────────────────────────
    let visible = usize::from(h - 2);
    let skip = log.len().saturating_sub(visible);
    for (i, entry) in log.iter().skip(skip).enumerate() {
        #[allow(clippy::cast_possible_truncation)] // i < visible <= h which is u16
        put_str(term, 1, 1 + i as u16, entry, Style::WHITE, Style::BLACK);
    }

    // ── Status line ──────────────────────────────────────────────
    for x in 0..w {
        term.change_cell(x, h - 1, ' ', Style::BLACK, Style::BLUE);
    }
    put_str(
        term,
        1,
        h - 1,
        "type, use arrows and F-keys, resize the window",
        Style::YELLOW | Attr::BOLD,
        Style::BLUE,
    );

    term.present()?;
    Ok(())
}

fn describe(event: KeyEvent) -> String {
    let alt = if event.alt { "Alt+" } else { "" };
    let key = match event.code {
        KeyCode::Char(' ') => "Space".into(),
        KeyCode::Char(c) => format!("'{c}'"),
        KeyCode::ENTER => "Enter".into(),
        KeyCode::TAB => "Tab".into(),
        KeyCode::BACKSPACE | KeyCode::BACKSPACE2 => "Backspace".into(),
        KeyCode::Ctrl(b) => format!("Ctrl-{b:#04x}"),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::Insert => "Insert".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
    };
    format!("{alt}{key}")
}

fn put_str(term: &mut Terminal, x: u16, y: u16, text: &str, fg: Style, bg: Style) {
    let w = term.width();
    let mut col = x;
    for ch in text.chars() {
        if col >= w {
            break;
        }
        term.change_cell(col, y, ch, fg, bg);
        col += 1;
    }
}
