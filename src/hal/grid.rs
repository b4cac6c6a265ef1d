//! In-memory character grid shared by display implementations.
//!
//! Emulates the behaviour of an HD44780 controller: a cursor that advances
//! after each character, clipping at the end of a row, and eight slots of
//! user-defined glyphs. The mock, terminal and OLED displays all keep one of
//! these and render it their own way.

extern crate alloc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::traits::{GlyphBitmap, GLYPH_SLOTS};

/// Code written for characters the controller ROM does not have.
pub const UNKNOWN_CODE: u8 = b'?';

/// A `width` x `height` grid of character codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharGrid {
    width: u8,
    height: u8,
    cells: Vec<u8>,
    cursor: (u8, u8),
    glyphs: [GlyphBitmap; GLYPH_SLOTS as usize],
}

impl CharGrid {
    /// Blank grid with the cursor at the origin.
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![b' '; width as usize * height as usize],
            cursor: (0, 0),
            glyphs: [[0; 8]; GLYPH_SLOTS as usize],
        }
    }

    /// Columns.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Cursor position as (column, row).
    pub fn cursor(&self) -> (u8, u8) {
        self.cursor
    }

    /// Blank every cell and home the cursor. Glyph definitions survive.
    pub fn clear(&mut self) {
        self.cells.fill(b' ');
        self.cursor = (0, 0);
    }

    /// Move the cursor. Out-of-range positions are kept; writes there are
    /// dropped.
    pub fn set_cursor(&mut self, col: u8, row: u8) {
        self.cursor = (col, row);
    }

    /// Write one code at the cursor and advance it.
    pub fn put(&mut self, code: u8) {
        let (col, row) = self.cursor;
        if col < self.width && row < self.height {
            let index = row as usize * self.width as usize + col as usize;
            self.cells[index] = code;
        }
        self.cursor.0 = col.saturating_add(1);
    }

    /// Write text at the cursor.
    ///
    /// `°` maps to the ROM degree sign; other non-ASCII characters become
    /// [`UNKNOWN_CODE`].
    pub fn write_str(&mut self, text: &str) {
        for c in text.chars() {
            self.put(rom_code(c));
        }
    }

    /// Store a user-defined glyph. Codes beyond the slot count are ignored.
    pub fn define_glyph(&mut self, code: u8, bitmap: &GlyphBitmap) {
        if let Some(slot) = self.glyphs.get_mut(code as usize) {
            *slot = *bitmap;
        }
    }

    /// Bitmap stored for a user-defined glyph code.
    pub fn glyph(&self, code: u8) -> Option<&GlyphBitmap> {
        self.glyphs.get(code as usize)
    }

    /// Code in one cell, or a blank outside the grid.
    pub fn code_at(&self, col: u8, row: u8) -> u8 {
        if col < self.width && row < self.height {
            self.cells[row as usize * self.width as usize + col as usize]
        } else {
            b' '
        }
    }

    /// Codes of one row.
    pub fn row(&self, row: u8) -> &[u8] {
        if row >= self.height {
            return &[];
        }
        let start = row as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// One row as text, each code mapped to the Latin-1 character of the
    /// same value.
    pub fn row_text(&self, row: u8) -> String {
        self.row(row).iter().map(|b| char::from(*b)).collect()
    }
}

/// HD44780 ROM code for a character.
pub fn rom_code(c: char) -> u8 {
    match c {
        '°' => crate::screen::glyphs::DEGREE,
        c if c.is_ascii() => c as u8,
        _ => UNKNOWN_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_advance_and_clip() {
        let mut grid = CharGrid::new(4, 2);
        grid.set_cursor(2, 1);
        grid.write_str("abc");
        assert_eq!(grid.row_text(1), "  ab");
        assert_eq!(grid.cursor(), (5, 1));
    }

    #[test]
    fn writes_outside_grid_are_dropped() {
        let mut grid = CharGrid::new(4, 2);
        grid.set_cursor(0, 5);
        grid.write_str("zz");
        assert_eq!(grid.row_text(0), "    ");
        assert_eq!(grid.row_text(1), "    ");
        assert!(grid.row(5).is_empty());
    }

    #[test]
    fn clear_keeps_glyphs() {
        let mut grid = CharGrid::new(4, 2);
        grid.define_glyph(2, &[1, 2, 3, 4, 5, 6, 7, 8]);
        grid.write_str("hi");
        grid.clear();
        assert_eq!(grid.row_text(0), "    ");
        assert_eq!(grid.glyph(2), Some(&[1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn rom_mapping() {
        assert_eq!(rom_code('A'), b'A');
        assert_eq!(rom_code('°'), 0xDF);
        assert_eq!(rom_code('é'), UNKNOWN_CODE);
    }
}
