//! Screen layouts drawn on the character display.
//!
//! ```text
//!  0123456789012345
//! +----------------+
//! |07:42p 18/10 24°|   standby: clock, date, temperature
//! |S Insert card   |
//! +----------------+
//! |U Local card    |   unlock: origin label, countdown
//! |Door close in  3|
//! +----------------+
//! ```
//!
//! Every line is cleared across the full width before it is written, so
//! shorter text never leaves characters from the previous screen behind.

use core::fmt::Write;

use chrono::{DateTime, Datelike, Timelike};
use heapless::String as HString;

use crate::config::DisplayConfig;
use crate::traits::{CharDisplay, GlyphBitmap};

/// Custom glyph codes and bitmaps.
pub mod glyphs {
    use crate::traits::GlyphBitmap;

    /// Hourglass shown while waiting for the broker.
    pub const WAITING: u8 = 1;
    /// Card outline shown on the standby screen.
    pub const STANDBY: u8 = 2;
    /// Open padlock shown after an unlock.
    pub const UNLOCK: u8 = 3;
    /// Cross shown for a rejected card.
    pub const FAIL: u8 = 4;
    /// Built-in degree sign of the HD44780 ROM.
    pub const DEGREE: u8 = 0xDF;

    /// Hourglass bitmap.
    pub const WAITING_BITMAP: GlyphBitmap = [0x1F, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x1F, 0x00];
    /// Card bitmap.
    pub const STANDBY_BITMAP: GlyphBitmap = [0x1F, 0x11, 0x15, 0x15, 0x15, 0x11, 0x1F, 0x00];
    /// Padlock bitmap.
    pub const UNLOCK_BITMAP: GlyphBitmap = [0x1B, 0x19, 0x1B, 0x1B, 0x15, 0x1B, 0x1F, 0x00];
    /// Cross bitmap.
    pub const FAIL_BITMAP: GlyphBitmap = [0x1F, 0x15, 0x1B, 0x15, 0x1F, 0x11, 0x1F, 0x00];

    /// All custom glyphs with their codes, in definition order.
    pub const ALL: [(u8, GlyphBitmap); 4] = [
        (WAITING, WAITING_BITMAP),
        (STANDBY, STANDBY_BITMAP),
        (UNLOCK, UNLOCK_BITMAP),
        (FAIL, FAIL_BITMAP),
    ];
}

/// Column of the unlock countdown digits.
pub const COUNTDOWN_COL: u8 = 14;
/// Column of the standby temperature field.
pub const TEMPERATURE_COL: u8 = 13;

/// Length of the rendered clock field, `"hh:mmX dd/mm"`.
pub const CLOCK_LEN: usize = 12;

/// Static part of the standby top row; the degree glyph follows it.
pub const STANDBY_TOP: &str = "--:--- --/-- --";
/// Standby bottom row.
pub const STANDBY_BOTTOM: &str = "  Insert card";
/// Waiting screen top row.
pub const WAITING_TOP: &str = "  Waiting for";
/// Waiting screen bottom row.
pub const WAITING_BOTTOM: &str = "MQTT client...";

const BLANKS: &str = "                ";

/// Line-oriented helpers over a [`CharDisplay`] of known size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Screen {
    width: u8,
    height: u8,
}

impl Screen {
    /// Screen of `width` columns and `height` rows.
    pub const fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    /// Screen sized from configuration.
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Columns.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Load every custom glyph into the display.
    pub fn define_glyphs<D: CharDisplay>(&self, display: &mut D) -> Result<(), D::Error> {
        for (code, bitmap) in glyphs::ALL.iter() {
            display.define_glyph(*code, bitmap)?;
        }
        Ok(())
    }

    /// Clear the whole screen and home the cursor.
    pub fn reset<D: CharDisplay>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear()?;
        display.set_cursor(0, 0)
    }

    /// Blank a row and leave the cursor at its first column.
    ///
    /// Rows outside the grid are ignored.
    pub fn clear_line<D: CharDisplay>(&self, display: &mut D, row: u8) -> Result<(), D::Error> {
        if row >= self.height {
            return Ok(());
        }
        display.set_cursor(0, row)?;
        let mut remaining = self.width as usize;
        while remaining > 0 {
            let n = remaining.min(BLANKS.len());
            display.write_str(&BLANKS[..n])?;
            remaining -= n;
        }
        display.set_cursor(0, row)
    }

    /// Blank a row, then write `text` from its first column.
    ///
    /// Text longer than the row is truncated.
    pub fn write_line<D: CharDisplay>(
        &self,
        display: &mut D,
        row: u8,
        text: &str,
    ) -> Result<(), D::Error> {
        if row >= self.height {
            return Ok(());
        }
        self.clear_line(display, row)?;
        display.write_str(truncate(text, self.width as usize))
    }

    /// Draw glyph `code` at `col`, `row`.
    pub fn put_glyph<D: CharDisplay>(
        &self,
        display: &mut D,
        col: u8,
        row: u8,
        code: u8,
    ) -> Result<(), D::Error> {
        display.set_cursor(col, row)?;
        display.write_code(code)
    }

    /// Write `text` at a fixed position without clearing anything.
    pub fn write_at<D: CharDisplay>(
        &self,
        display: &mut D,
        col: u8,
        row: u8,
        text: &str,
    ) -> Result<(), D::Error> {
        if row >= self.height || col >= self.width {
            return Ok(());
        }
        display.set_cursor(col, row)?;
        display.write_str(truncate(text, (self.width - col) as usize))
    }

    /// Two-line screen with an icon in the top-left corner.
    pub fn show_status<D: CharDisplay>(
        &self,
        display: &mut D,
        icon: u8,
        top: &str,
        bottom: &str,
    ) -> Result<(), D::Error> {
        self.write_line(display, 0, top)?;
        self.put_glyph(display, 0, 0, icon)?;
        self.write_line(display, 1, bottom)
    }

    /// "Waiting for MQTT client..." screen.
    pub fn show_waiting<D: CharDisplay>(&self, display: &mut D) -> Result<(), D::Error> {
        self.reset(display)?;
        self.show_status(display, glyphs::WAITING, WAITING_TOP, WAITING_BOTTOM)
    }

    /// Static standby template.
    ///
    /// The caller clears the screen and waits for the display to settle
    /// first.
    pub fn show_standby_template<D: CharDisplay>(&self, display: &mut D) -> Result<(), D::Error> {
        self.write_line(display, 0, STANDBY_TOP)?;
        display.write_code(glyphs::DEGREE)?;
        self.write_line(display, 1, STANDBY_BOTTOM)?;
        self.put_glyph(display, 0, 1, glyphs::STANDBY)
    }

    /// Overwrite the clock/date field of the standby template.
    pub fn show_clock<D: CharDisplay>(&self, display: &mut D, clock: &str) -> Result<(), D::Error> {
        self.write_at(display, 0, 0, clock)
    }

    /// Overwrite the temperature field, right-aligned in two columns.
    pub fn show_temperature<D: CharDisplay>(
        &self,
        display: &mut D,
        degrees: i32,
    ) -> Result<(), D::Error> {
        let mut field: HString<12> = HString::new();
        let _ = write!(field, "{:>2}", degrees);
        self.write_at(display, TEMPERATURE_COL, 0, truncate(&field, 2))
    }

    /// Redraw the seconds left on the unlock countdown.
    pub fn show_countdown<D: CharDisplay>(
        &self,
        display: &mut D,
        remaining: u8,
    ) -> Result<(), D::Error> {
        let mut digits: HString<3> = HString::new();
        let _ = write!(digits, "{}", remaining);
        self.write_at(display, COUNTDOWN_COL, 1, "  ")?;
        self.write_at(display, COUNTDOWN_COL, 1, &digits)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

/// Longest prefix of `text` that fits in `max` characters.
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Render local time as `"hh:mmX dd/mm"` with a 12-hour clock.
///
/// `X` is `a` before noon and `p` from noon on. Returns `None` if the
/// timestamp is outside the range chrono can represent.
pub fn format_clock(epoch_secs: i64, utc_offset_secs: i64) -> Option<HString<CLOCK_LEN>> {
    let local = DateTime::from_timestamp(epoch_secs.checked_add(utc_offset_secs)?, 0)?.naive_utc();
    let (pm, hour) = local.hour12();

    let mut out = HString::new();
    write!(
        out,
        "{:02}:{:02}{} {:02}/{:02}",
        hour,
        local.minute(),
        if pm { 'p' } else { 'a' },
        local.day(),
        local.month()
    )
    .ok()?;
    Some(out)
}

/// Second of the minute for a UTC timestamp.
pub fn second_of_minute(epoch_secs: i64) -> u32 {
    epoch_secs.rem_euclid(60) as u32
}

/// Glyph bitmap for a custom code, if it is one of ours.
pub fn glyph_bitmap(code: u8) -> Option<&'static GlyphBitmap> {
    glyphs::ALL
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, bitmap)| bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockDisplay;

    fn screen_and_display() -> (Screen, MockDisplay) {
        (Screen::new(16, 2), MockDisplay::new(16, 2))
    }

    // =========================================================================
    // Line helpers
    // =========================================================================

    #[test]
    fn write_line_clears_leftovers() {
        let (screen, mut lcd) = screen_and_display();
        screen.write_line(&mut lcd, 0, "  Unlock failed").unwrap();
        screen.write_line(&mut lcd, 0, "  Web").unwrap();
        assert_eq!(lcd.row_text(0), "  Web           ");
    }

    #[test]
    fn write_line_truncates_to_width() {
        let (screen, mut lcd) = screen_and_display();
        screen
            .write_line(&mut lcd, 1, "This line is far too long")
            .unwrap();
        assert_eq!(lcd.row_text(1), "This line is far");
    }

    #[test]
    fn write_line_ignores_rows_outside_grid() {
        let (screen, mut lcd) = screen_and_display();
        screen.write_line(&mut lcd, 2, "nowhere").unwrap();
        assert_eq!(lcd.row_text(0).trim(), "");
        assert_eq!(lcd.row_text(1).trim(), "");
    }

    #[test]
    fn status_screen_puts_icon_over_padding() {
        let (screen, mut lcd) = screen_and_display();
        screen
            .show_status(&mut lcd, glyphs::UNLOCK, "  Telegram", "Door close in ")
            .unwrap();
        assert_eq!(lcd.code_at(0, 0), glyphs::UNLOCK);
        assert_eq!(lcd.row_text(0), "\u{3} Telegram      ");
        assert_eq!(lcd.row_text(1), "Door close in   ");
    }

    #[test]
    fn countdown_overwrites_previous_digits() {
        let (screen, mut lcd) = screen_and_display();
        screen.show_countdown(&mut lcd, 10).unwrap();
        screen.show_countdown(&mut lcd, 9).unwrap();
        assert_eq!(&lcd.row_text(1)[14..], "9 ");
    }

    // =========================================================================
    // Standby
    // =========================================================================

    #[test]
    fn standby_template_layout() {
        let (screen, mut lcd) = screen_and_display();
        screen.show_standby_template(&mut lcd).unwrap();
        assert_eq!(&lcd.row_text(0)[..15], STANDBY_TOP);
        assert_eq!(lcd.code_at(15, 0), glyphs::DEGREE);
        assert_eq!(lcd.code_at(0, 1), glyphs::STANDBY);
        assert_eq!(&lcd.row_text(1)[1..13], " Insert card");
    }

    #[test]
    fn temperature_is_right_aligned() {
        let (screen, mut lcd) = screen_and_display();
        screen.show_standby_template(&mut lcd).unwrap();
        screen.show_temperature(&mut lcd, 7).unwrap();
        assert_eq!(&lcd.row_text(0)[13..15], " 7");
        screen.show_temperature(&mut lcd, 31).unwrap();
        assert_eq!(&lcd.row_text(0)[13..15], "31");
        assert_eq!(lcd.code_at(15, 0), glyphs::DEGREE);
    }

    #[test]
    fn glyph_lookup() {
        assert_eq!(glyph_bitmap(glyphs::FAIL), Some(&glyphs::FAIL_BITMAP));
        assert_eq!(glyph_bitmap(glyphs::DEGREE), None);
    }

    // =========================================================================
    // Clock formatting
    // =========================================================================

    #[test]
    fn clock_morning() {
        // 2024-03-05 09:07:00 UTC
        assert_eq!(format_clock(1_709_629_620, 0).unwrap().as_str(), "09:07a 05/03");
    }

    #[test]
    fn clock_noon_is_pm() {
        // 2024-03-05 12:30:00 UTC
        assert_eq!(format_clock(1_709_641_800, 0).unwrap().as_str(), "12:30p 05/03");
    }

    #[test]
    fn clock_midnight_is_twelve_am() {
        // 2024-03-05 00:15:00 UTC
        assert_eq!(format_clock(1_709_597_700, 0).unwrap().as_str(), "12:15a 05/03");
    }

    #[test]
    fn clock_applies_offset_across_date_line() {
        // 2024-03-05 20:00:00 UTC is 03:00 on the 6th at UTC+7
        assert_eq!(
            format_clock(1_709_668_800, 7 * 3600).unwrap().as_str(),
            "03:00a 06/03"
        );
    }

    #[test]
    fn seconds_of_minute() {
        assert_eq!(second_of_minute(1_709_629_620), 0);
        assert_eq!(second_of_minute(1_709_629_679), 59);
        assert_eq!(second_of_minute(-1), 59);
    }
}
