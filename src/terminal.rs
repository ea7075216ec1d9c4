// SPDX-License-Identifier: MIT
//
// Terminal session — lifecycle, raw mode, and the public surface.
//
// Safety: this module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), poll, and sigaction. These are the
// standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The session owns everything with a lifetime: the two /dev/tty
// handles, the saved termios, the back and front buffers, the input
// ring, and the renderer. init() puts the terminal into raw mode and
// the alternate screen; shutdown() (or Drop, or the panic hook)
// restores it. In between, the application paints cells and pulls key
// events.
//
// The one concurrent actor is the SIGWINCH handler. It sets a single
// atomic flag and returns; present() and clear() observe the flag and
// run the resize dance on the application's own thread.
//
// The panic hook deserves a note: a panic in raw mode would otherwise
// leave the user's shell without echo or line editing, with the
// message invisible on the alternate screen. The hook reopens
// /dev/tty, writes a pre-built restore sequence, puts termios back
// from a global backup, and only then lets the original hook print.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use crate::buffer::CellBuffer;
use crate::caps::Capabilities;
use crate::cell::{Cell, Style};
use crate::input::{self, InputMode, KeyEvent};
use crate::render::{RenderStats, Renderer};
use crate::ringbuf::RingBuf;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Everything that can go wrong between `init` and `shutdown`.
#[derive(Debug)]
pub enum Error {
    /// `$TERM` is unset or names a terminal with no capability table.
    UnsupportedTerminal,
    /// `/dev/tty` could not be opened for reading and writing.
    FailedToOpenTty(io::Error),
    /// A read delivered more bytes than the input ring can hold; the
    /// bytes were dropped. Subsequent event waits resume normally.
    InputOverflow,
    /// An I/O error on the terminal streams.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedTerminal => write!(f, "unsupported terminal"),
            Self::FailedToOpenTty(err) => write!(f, "failed to open /dev/tty: {err}"),
            Self::InputOverflow => write!(f, "input buffer overflow, input discarded"),
            Self::Io(err) => write!(f, "terminal i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FailedToOpenTty(err) | Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

// ─── Resize Signal ───────────────────────────────────────────────────────────

/// Set by the SIGWINCH handler, consumed by `present` and `clear`.
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    // The only thing a signal handler may safely do here: one atomic
    // store.
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

#[cfg(unix)]
fn install_sigwinch_handler() {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    });
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {
    // No SIGWINCH off unix; dimension changes go unnoticed until an
    // explicit re-init.
}

// ─── Panic-Safe Restore ──────────────────────────────────────────────────────

/// Global backup of the original termios for the panic hook, which has
/// no access to the session that saved it.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Terminal restore sequence for emergency use: show cursor, reset
/// attributes, leave keypad mode, leave the alternate screen — in that
/// order, so the restored shell content appears last and clean.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h\x1b(B\x1b[m\x1b[?1l\x1b>\x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before the error
/// prints. Installed at most once per process.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            original(info);
        }));
    });
}

/// Best-effort terminal restore from panic context. The session object
/// is unreachable here, so the tty is reopened fresh.
fn emergency_restore() {
    if let Ok(mut tty) = OpenOptions::new().write(true).open("/dev/tty") {
        let _ = tty.write_all(EMERGENCY_RESTORE);
        let _ = tty.flush();

        #[cfg(unix)]
        if let Ok(guard) = TERMIOS_BACKUP.lock() {
            if let Some(ref original) = *guard {
                unsafe {
                    let _ = libc::tcsetattr(tty.as_raw_fd(), libc::TCSAFLUSH, original);
                }
            }
        }
    }
}

// ─── Platform Queries ────────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)`.
#[cfg(unix)]
fn query_size(tty: &File) -> Option<(u16, u16)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(tty.as_raw_fd(), libc::TIOCGWINSZ, &raw mut ws) };
    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some((ws.ws_col, ws.ws_row))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn query_size(_tty: &File) -> Option<(u16, u16)> {
    None
}

/// Wait for the input stream to become readable.
///
/// `timeout_ms < 0` blocks indefinitely. `Ok(false)` means the timeout
/// elapsed with no input. Interruption by a signal surfaces as an
/// `Interrupted` error for the caller to retry.
#[cfg(unix)]
fn wait_ready(tty: &File, timeout_ms: i32) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd: tty.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let ready = unsafe { libc::poll(&raw mut pfd, 1, timeout_ms) };
    match ready {
        0 => Ok(false),
        r if r > 0 => Ok(true),
        _ => Err(io::Error::last_os_error()),
    }
}

#[cfg(not(unix))]
fn wait_ready(_tty: &File, _timeout_ms: i32) -> io::Result<bool> {
    Ok(true)
}

// ─── Terminal ────────────────────────────────────────────────────────────────

/// Capacity of the input byte ring. A keypress is at most a handful of
/// bytes; 4 KB absorbs pastes and key-repeat bursts between event
/// waits.
const INPUT_RING_CAPACITY: usize = 4096;

/// Bytes read from the tty per readiness wake.
const READ_CHUNK: usize = 32;

/// A terminal session: the cell grid, its renderer, and the raw-mode
/// TTY underneath.
///
/// Exists between [`init`](Self::init) and [`shutdown`](Self::shutdown).
/// Dropping an active session restores the terminal too.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use termgrid::cell::Style;
/// use termgrid::input::KeyCode;
/// use termgrid::terminal::Terminal;
///
/// let mut term = Terminal::init()?;
/// term.change_cell(0, 0, '>', Style::GREEN, Style::BLACK);
/// term.present()?;
///
/// while let Some(event) = term.peek_event(Duration::from_secs(5))? {
///     if event.code == KeyCode::ESC {
///         break;
///     }
/// }
/// term.shutdown()?;
/// # Ok::<(), termgrid::terminal::Error>(())
/// ```
pub struct Terminal {
    output: File,
    input: File,
    caps: &'static Capabilities,
    back: CellBuffer,
    front: CellBuffer,
    renderer: Renderer,
    ring: RingBuf,
    mode: InputMode,
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    active: bool,
}

impl Terminal {
    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Open the controlling terminal and enter cell-grid mode.
    ///
    /// Resolves the capability table from `$TERM`, installs the resize
    /// handler and panic hook, switches the tty to raw mode, enters the
    /// alternate screen with the cursor hidden, and allocates both cell
    /// buffers at the current terminal size.
    ///
    /// # Errors
    ///
    /// [`Error::FailedToOpenTty`] when `/dev/tty` cannot be opened,
    /// [`Error::UnsupportedTerminal`] when `$TERM` is unknown, and
    /// [`Error::Io`] for raw-mode or write failures.
    pub fn init() -> Result<Self, Error> {
        let output = OpenOptions::new()
            .write(true)
            .open("/dev/tty")
            .map_err(Error::FailedToOpenTty)?;
        let input = OpenOptions::new()
            .read(true)
            .open("/dev/tty")
            .map_err(Error::FailedToOpenTty)?;
        let caps = Capabilities::detect().ok_or(Error::UnsupportedTerminal)?;

        install_sigwinch_handler();
        install_panic_hook();

        let (cols, rows) = query_size(&output).unwrap_or((80, 24));

        let mut term = Self {
            output,
            input,
            caps,
            back: CellBuffer::new(cols, rows),
            front: CellBuffer::new(cols, rows),
            renderer: Renderer::new(),
            ring: RingBuf::new(INPUT_RING_CAPACITY),
            mode: InputMode::default(),
            #[cfg(unix)]
            original_termios: None,
            active: false,
        };

        term.enable_raw_mode()?;

        let out = term.renderer.output_mut();
        out.put_cap(caps.enter_ca);
        out.put_cap(caps.enter_keypad);
        out.put_cap(caps.hide_cursor);
        out.put_cap(caps.clear_screen);
        term.renderer.flush_to(&mut term.output)?;

        term.active = true;
        Ok(term)
    }

    /// Leave cell-grid mode and restore the terminal.
    ///
    /// Shows the cursor, resets attributes, clears the screen, leaves
    /// keypad mode and the alternate screen, and puts the original
    /// termios back. Idempotent; also run by `Drop`.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore writes or termios call fail.
    pub fn shutdown(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let caps = self.caps;
        let out = self.renderer.output_mut();
        out.put_cap(caps.show_cursor);
        out.put_cap(caps.sgr_reset);
        out.put_cap(caps.clear_screen);
        out.put_cap(caps.exit_keypad);
        out.put_cap(caps.exit_ca);
        self.renderer.flush_to(&mut self.output)?;

        self.restore_mode()?;
        self.active = false;
        Ok(())
    }

    // ─── Dimensions ──────────────────────────────────────────────────────

    /// Current width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.back.width()
    }

    /// Current height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.back.height()
    }

    // ─── Cell Operations ─────────────────────────────────────────────────

    /// Overwrite one back-buffer cell. Out-of-bounds writes are
    /// ignored — the application may be drawing against dimensions a
    /// resize just invalidated.
    #[inline]
    pub fn put_cell(&mut self, x: u16, y: u16, cell: Cell) {
        self.back.set(x, y, cell);
    }

    /// Sugar over [`put_cell`](Self::put_cell).
    #[inline]
    pub fn change_cell(&mut self, x: u16, y: u16, ch: char, fg: Style, bg: Style) {
        self.put_cell(x, y, Cell::styled(ch, fg, bg));
    }

    /// Copy a `w × h` cell rectangle into the back buffer at `(x, y)`.
    /// Rejected whole if it would cross either buffer edge.
    #[inline]
    pub fn blit(&mut self, x: u16, y: u16, w: u16, h: u16, cells: &[Cell]) {
        self.back.blit(x, y, w, h, cells);
    }

    /// Fill the back buffer with the default cell.
    ///
    /// # Errors
    ///
    /// Returns an error if a pending resize's screen clear fails to
    /// write.
    pub fn clear(&mut self) -> io::Result<()> {
        self.check_resize()?;
        self.back.clear();
        Ok(())
    }

    /// Reconcile the terminal display with the back buffer.
    ///
    /// After a successful call the screen shows the back buffer and the
    /// front buffer equals it. No cursor position or attribute state is
    /// promised afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush to the terminal fails.
    pub fn present(&mut self) -> io::Result<RenderStats> {
        self.check_resize()?;
        let stats = self.renderer.present(&self.back, &mut self.front, self.caps);
        self.renderer.flush_to(&mut self.output)?;
        Ok(stats)
    }

    // ─── Input Mode ──────────────────────────────────────────────────────

    /// The current ESC-disambiguation mode.
    #[inline]
    #[must_use]
    pub const fn input_mode(&self) -> InputMode {
        self.mode
    }

    /// Select how a bare ESC byte is resolved.
    #[inline]
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    // ─── Event Waiting ───────────────────────────────────────────────────

    /// Block until the next key event.
    ///
    /// # Errors
    ///
    /// [`Error::InputOverflow`] when a read did not fit the ring (that
    /// input is lost; later waits recover), or [`Error::Io`] on stream
    /// errors.
    pub fn poll_event(&mut self) -> Result<KeyEvent, Error> {
        loop {
            if let Some(event) = self.wait_event(None)? {
                return Ok(event);
            }
        }
    }

    /// Wait up to `timeout` for a key event. `Ok(None)` on expiry.
    ///
    /// # Errors
    ///
    /// Same contract as [`poll_event`](Self::poll_event).
    pub fn peek_event(&mut self, timeout: Duration) -> Result<Option<KeyEvent>, Error> {
        self.wait_event(Some(timeout))
    }

    /// The shared wait loop: drain the ring, then alternate between
    /// readiness waits and 32-byte reads until an event completes or
    /// the deadline passes.
    fn wait_event(&mut self, timeout: Option<Duration>) -> Result<Option<KeyEvent>, Error> {
        if let Some(event) = input::extract_event(&mut self.ring, self.caps, self.mode) {
            return Ok(Some(event));
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let wait_ms = match deadline {
                None => -1,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(None);
                    }
                    i32::try_from(remaining.as_millis()).unwrap_or(i32::MAX).max(1)
                }
            };

            match wait_ready(&self.input, wait_ms) {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                // A signal (usually SIGWINCH) interrupted the wait;
                // re-check the deadline and wait again.
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Io(err)),
            }

            let n = match self.input.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Io(err)),
            };
            // Readable but zero bytes: the wake came from a resize
            // signal, not from input.
            if n == 0 {
                continue;
            }

            if self.ring.free() < n {
                return Err(Error::InputOverflow);
            }
            let pushed = self.ring.push(&chunk[..n]);
            debug_assert!(pushed);

            if let Some(event) = input::extract_event(&mut self.ring, self.caps, self.mode) {
                return Ok(Some(event));
            }
        }
    }

    // ─── Resize ──────────────────────────────────────────────────────────

    /// Consume a pending resize: re-query dimensions, resize the back
    /// buffer (overlap-preserving), clear the front buffer so every
    /// cell rediffes, and blank the screen with default attributes.
    fn check_resize(&mut self) -> io::Result<()> {
        if !RESIZE_PENDING.swap(false, Ordering::Relaxed) {
            return Ok(());
        }

        let (cols, rows) =
            query_size(&self.output).unwrap_or((self.back.width(), self.back.height()));
        self.back.resize(cols, rows);
        self.front.resize(cols, rows);
        self.front.clear();
        self.renderer.force_redraw();

        let caps = self.caps;
        let out = self.renderer.output_mut();
        out.put_cap(caps.sgr_reset);
        caps.sgr
            .expand(
                out,
                u32::from(Style::WHITE.color()),
                u32::from(Style::BLACK.color()),
            )
            .ok();
        out.put_cap(caps.clear_screen);
        self.renderer.flush_to(&mut self.output)
    }

    // ─── Raw Mode ────────────────────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let fd = self.output.as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            let original = termios;
            self.original_termios = Some(original);
            // Also into the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(original);
            }

            // No input translation, no output post-processing, no echo,
            // no canonical lines, no signal keys, 8-bit characters.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=0: reads return whatever is available,
            // even nothing — the event loop waits with poll instead.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn restore_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            let fd = self.output.as_raw_fd();
            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Restored cleanly — the panic hook has nothing to undo.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn restore_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.shutdown();
        }
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Terminal({}x{}, {})",
            self.width(),
            self.height(),
            self.caps.name
        )
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
