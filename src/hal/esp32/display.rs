//! SSD1306 OLED display presented as a 16x2 character display.
//!
//! The controller speaks in character cells and user-defined glyphs, the way
//! an HD44780 LCD works. This driver keeps a [`CharGrid`] of what an LCD
//! would show and redraws the OLED from it after every write.
//!
//! # Wiring
//!
//! - SDA → GPIO21
//! - SCL → GPIO22
//! - VCC → 3.3V
//! - GND → GND

use crate::hal::grid::CharGrid;
use crate::screen::glyphs::DEGREE;
use crate::traits::{CharDisplay, GlyphBitmap, GLYPH_SLOTS};
use embedded_graphics::{
    mono_font::{iso_8859_1::FONT_8X13, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

/// SSD1306 display type alias for cleaner code.
type DisplayDriver<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Cell width in pixels; 16 cells fill the 128 pixel panel.
const CELL_W: i32 = 8;
/// Vertical pitch between character rows.
const ROW_PITCH: i32 = 32;
/// Top margin of the first row.
const TOP: i32 = 9;

/// SSD1306 OLED for ESP32.
///
/// # Display Layout
///
/// ```text
/// ┌────────────────────────────┐
/// │                            │
/// │ ▣09:07AM 05/03   25°       │  Row 0
/// │                            │
/// │   Insert card              │  Row 1
/// │                            │
/// └────────────────────────────┘
/// ```
pub struct Esp32Display<'d> {
    display: DisplayDriver<'d>,
    grid: CharGrid,
}

impl<'d> Esp32Display<'d> {
    /// Creates a new display instance with a `width` x `height` grid.
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C driver configured for GPIO21/22
    pub fn new(i2c: I2cDriver<'d>, width: u8, height: u8) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        Self {
            display,
            grid: CharGrid::new(width, height),
        }
    }

    /// Redraw every cell and push the frame buffer.
    fn refresh(&mut self) -> Result<(), DisplayError> {
        self.display.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_8X13, BinaryColor::On);

        for row in 0..self.grid.height() {
            let y = TOP + row as i32 * ROW_PITCH;
            for (col, code) in self.grid.row(row).iter().enumerate() {
                let origin = Point::new(col as i32 * CELL_W, y);
                match *code {
                    b' ' => {}
                    c if c < GLYPH_SLOTS => {
                        if let Some(bitmap) = self.grid.glyph(c) {
                            draw_glyph(&mut self.display, origin, bitmap)?;
                        }
                    }
                    DEGREE => draw_char(&mut self.display, origin, '°', style)?,
                    c if c.is_ascii_graphic() => {
                        draw_char(&mut self.display, origin, c as char, style)?
                    }
                    _ => draw_char(&mut self.display, origin, '?', style)?,
                }
            }
        }

        self.display.flush()?;
        Ok(())
    }
}

fn draw_char(
    target: &mut DisplayDriver<'_>,
    origin: Point,
    c: char,
    style: MonoTextStyle<'_, BinaryColor>,
) -> Result<(), DisplayError> {
    let mut buf = [0u8; 4];
    Text::with_baseline(c.encode_utf8(&mut buf), origin, style, Baseline::Top).draw(target)?;
    Ok(())
}

/// Draw a 5x8 LCD glyph, one pixel per bit, centered in the cell.
fn draw_glyph(
    target: &mut DisplayDriver<'_>,
    origin: Point,
    bitmap: &GlyphBitmap,
) -> Result<(), DisplayError> {
    let pixels = bitmap.iter().enumerate().flat_map(|(y, line)| {
        (0..5).filter_map(move |x| {
            (line & (0x10 >> x) != 0).then(|| Pixel(Point::new(x + 1, y as i32 + 2), BinaryColor::On))
        })
    });
    target.draw_iter(pixels.map(|Pixel(p, c)| Pixel(p + origin, c)))?;
    Ok(())
}

impl CharDisplay for Esp32Display<'_> {
    type Error = DisplayError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.display.init()?;
        self.clear()
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.grid.clear();
        self.display.clear(BinaryColor::Off)?;
        self.display.flush()?;
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        self.grid.set_cursor(col, row);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        self.grid.write_str(text);
        self.refresh()
    }

    fn write_code(&mut self, code: u8) -> Result<(), Self::Error> {
        self.grid.put(code);
        self.refresh()
    }

    fn define_glyph(&mut self, code: u8, bitmap: &GlyphBitmap) -> Result<(), Self::Error> {
        self.grid.define_glyph(code, bitmap);
        Ok(())
    }
}

/// Display error type.
#[derive(Debug)]
pub struct DisplayError;

impl From<display_interface::DisplayError> for DisplayError {
    fn from(_: display_interface::DisplayError) -> Self {
        DisplayError
    }
}
