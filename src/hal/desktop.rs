//! Desktop devices for running the controller in a terminal.
//!
//! Cards are "presented" by typing their UID as hex on stdin, the display
//! is drawn as a framed 16x2 box, and the relay and buzzer just log what
//! they would do.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{info, warn};

use super::grid::CharGrid;
use crate::credential::{Credential, MAX_UID_LEN};
use crate::telemetry::TelemetrySample;
use crate::traits::{
    Buzzer, CardReader, CharDisplay, ClimateSensor, Delay, DoorHardware, GlyphBitmap, LockRelay,
    LockState, WallClock,
};

/// Desktop devices never fail.
pub type Infallible = core::convert::Infallible;

// ============================================================================
// Time
// ============================================================================

/// Wall clock backed by the host's system time.
///
/// Uptime counts from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    /// Clock whose uptime starts now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    fn now_epoch_secs(&self) -> Option<i64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }

    fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Delay implemented with `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

// ============================================================================
// Card reader
// ============================================================================

/// Parse a typed UID such as `"AB CD EF 00"`, `"ab:cd:ef:00"` or `"abcdef00"`.
///
/// Returns `None` for empty input, odd digit counts, non-hex characters or
/// more than [`MAX_UID_LEN`] bytes.
pub fn parse_hex_uid(line: &str) -> Option<Credential> {
    let digits: Vec<u8> = line
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':' | b'-' | b'\t' | b'\r' | b'\n'))
        .collect();

    if digits.is_empty() || digits.len() % 2 != 0 || digits.len() / 2 > MAX_UID_LEN {
        return None;
    }

    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks(2) {
        let text = core::str::from_utf8(pair).ok()?;
        bytes.push(u8::from_str_radix(text, 16).ok()?);
    }
    Some(Credential::from_slice(&bytes))
}

/// Card reader fed by lines typed on stdin.
///
/// A background thread reads stdin and forwards each parsed UID, so
/// `read_uid()` never blocks.
pub struct StdinReader {
    rx: Receiver<Credential>,
    closed: bool,
}

impl StdinReader {
    /// Start reading stdin.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_hex_uid(&line) {
                    Some(card) => {
                        if tx.send(card).is_err() {
                            break;
                        }
                    }
                    None => warn!("Not a card UID: {:?}", line.trim()),
                }
            }
        });
        Self { rx, closed: false }
    }
}

impl CardReader for StdinReader {
    fn read_uid(&mut self) -> Option<Credential> {
        match self.rx.try_recv() {
            Ok(card) => Some(card),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.closed {
                    info!("stdin closed, no more cards");
                    self.closed = true;
                }
                None
            }
        }
    }
}

// ============================================================================
// Display
// ============================================================================

/// Character display drawn on the terminal.
///
/// The grid is printed as a framed box whenever its contents change.
/// User-defined glyphs are shown as `#`, the degree sign as `°`.
pub struct TerminalDisplay {
    grid: CharGrid,
    shown: Option<CharGrid>,
}

impl TerminalDisplay {
    /// Display of the given size.
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            grid: CharGrid::new(width, height),
            shown: None,
        }
    }

    /// Current contents.
    pub fn grid(&self) -> &CharGrid {
        &self.grid
    }

    /// Render the grid as framed text lines.
    pub fn frame(&self) -> Vec<String> {
        let border = format!("+{}+", "-".repeat(self.grid.width() as usize));
        let mut lines = vec![border.clone()];
        for row in 0..self.grid.height() {
            let text: String = self.grid.row(row).iter().map(|c| printable(*c)).collect();
            lines.push(format!("|{}|", text));
        }
        lines.push(border);
        lines
    }

    fn refresh(&mut self) {
        if self.shown.as_ref() == Some(&self.grid) {
            return;
        }
        println!("{}", self.frame().join("\n"));
        self.shown = Some(self.grid.clone());
    }
}

fn printable(code: u8) -> char {
    match code {
        0..=7 => '#',
        0xDF => '°',
        0x20..=0x7E => code as char,
        _ => '?',
    }
}

impl CharDisplay for TerminalDisplay {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        self.grid.clear();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Infallible> {
        self.grid.clear();
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Infallible> {
        self.grid.set_cursor(col, row);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Infallible> {
        self.grid.write_str(text);
        self.refresh();
        Ok(())
    }

    fn write_code(&mut self, code: u8) -> Result<(), Infallible> {
        self.grid.put(code);
        self.refresh();
        Ok(())
    }

    fn define_glyph(&mut self, code: u8, bitmap: &GlyphBitmap) -> Result<(), Infallible> {
        self.grid.define_glyph(code, bitmap);
        Ok(())
    }
}

// ============================================================================
// Actuators
// ============================================================================

/// Relay that only logs.
#[derive(Debug, Default)]
pub struct LoggingRelay {
    state: LockState,
}

impl LockRelay for LoggingRelay {
    type Error = Infallible;

    fn set_state(&mut self, state: LockState) -> Result<(), Infallible> {
        info!("Relay: door {}", state.as_str());
        self.state = state;
        Ok(())
    }

    fn state(&self) -> LockState {
        self.state
    }
}

/// Buzzer that only logs.
#[derive(Debug, Default)]
pub struct LoggingBuzzer;

impl Buzzer for LoggingBuzzer {
    type Error = Infallible;

    fn start_tone(&mut self, freq_hz: u32) -> Result<(), Infallible> {
        info!("Buzzer: beep {} Hz", freq_hz);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

// ============================================================================
// Sensor
// ============================================================================

/// Climate sensor producing a slow drift around room conditions.
///
/// Every `glitch_every`-th read returns an out-of-range reading, the way a
/// DHT11 occasionally does.
#[derive(Debug)]
pub struct SimulatedSensor {
    reads: u32,
    glitch_every: u32,
}

impl SimulatedSensor {
    /// Sensor glitching every 50 reads.
    pub fn new() -> Self {
        Self {
            reads: 0,
            glitch_every: 50,
        }
    }

    /// Change how often glitches happen (0 = never).
    pub fn with_glitch_every(mut self, reads: u32) -> Self {
        self.glitch_every = reads;
        self
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateSensor for SimulatedSensor {
    type Error = Infallible;

    fn read(&mut self) -> Result<TelemetrySample, Infallible> {
        self.reads = self.reads.wrapping_add(1);
        if self.glitch_every != 0 && self.reads % self.glitch_every == 0 {
            return Ok(TelemetrySample::new(255.0, 255.0));
        }
        // Triangle wave, 0..=4 over 800 reads
        let phase = (self.reads % 800) as f32 / 100.0;
        let drift = if phase < 4.0 { phase } else { 8.0 - phase };
        Ok(TelemetrySample::new(26.0 + drift, 58.0 + drift * 2.0))
    }
}

// ============================================================================
// Board
// ============================================================================

/// [`DoorHardware`] family for the terminal simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopBoard;

impl DoorHardware for DesktopBoard {
    type Reader = StdinReader;
    type Display = TerminalDisplay;
    type Relay = LoggingRelay;
    type Buzzer = LoggingBuzzer;
    type Sensor = SimulatedSensor;
    type Clock = SystemClock;
    type Delay = StdDelay;
}
