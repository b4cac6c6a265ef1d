//! Character display abstraction.
//!
//! This module defines the [`CharDisplay`] trait modelled on the classic
//! HD44780-style character LCD: a fixed grid of cells addressed by column
//! and row, with up to eight user-defined 5x8 glyphs.

use core::fmt::Debug;

/// Number of user-definable glyph slots.
pub const GLYPH_SLOTS: u8 = 8;

/// Pixel rows of a glyph; only the low five bits of each row are used.
pub type GlyphBitmap = [u8; 8];

/// Character display trait.
///
/// Implementors provide hardware-specific rendering for displays like
/// I2C character LCDs, OLEDs emulating a character grid, or simulated
/// displays for testing.
///
/// Writes past the end of a row are clipped; the cursor does not wrap.
///
/// # Example
///
/// ```ignore
/// use rs_doorlock::traits::CharDisplay;
///
/// struct MyDisplay { /* ... */ }
///
/// impl CharDisplay for MyDisplay {
///     type Error = ();
///
///     fn init(&mut self) -> Result<(), ()> { Ok(()) }
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), ()> { Ok(()) }
///     fn write_str(&mut self, text: &str) -> Result<(), ()> { Ok(()) }
///     fn write_code(&mut self, code: u8) -> Result<(), ()> { Ok(()) }
///     fn define_glyph(&mut self, code: u8, bitmap: &[u8; 8]) -> Result<(), ()> { Ok(()) }
/// }
/// ```
pub trait CharDisplay {
    /// Error type for display operations.
    type Error: Debug;

    /// Initializes the display hardware.
    ///
    /// Called once at startup. Implementations should configure the
    /// controller, switch on the backlight and clear the screen.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Clears the display and homes the cursor.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Moves the cursor to `col`, `row` (both zero-based).
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;

    /// Writes text at the cursor, advancing it.
    fn write_str(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Writes one raw character code at the cursor.
    ///
    /// Codes below [`GLYPH_SLOTS`] select user-defined glyphs; higher codes
    /// select the controller's built-in character set (e.g. `0xDF` for the
    /// degree sign).
    fn write_code(&mut self, code: u8) -> Result<(), Self::Error>;

    /// Stores a user-defined glyph in slot `code`.
    fn define_glyph(&mut self, code: u8, bitmap: &GlyphBitmap) -> Result<(), Self::Error>;
}
