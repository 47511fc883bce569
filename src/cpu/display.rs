//! Monochrome 64x32 display and the sprite compositor.
//!
//! Each scanline is packed into a `u64`, bit 0 being the leftmost pixel.
//! Sprites are XORed onto the bitmap and wrap around both edges.

use serde::{Serialize, Deserialize};

/// Display width in pixels.
pub const WIDTH: usize = 64;

/// Display height in pixels.
pub const HEIGHT: usize = 32;

/// Width of one sprite row in pixels.
pub const SPRITE_WIDTH: usize = 8;

/// The display bitmap: 32 rows of 64 one-bit pixels.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    rows: [u64; HEIGHT],
}

impl Display {
    /// Create a blank display.
    pub const fn new() -> Self {
        Self { rows: [0; HEIGHT] }
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        self.rows = [0; HEIGHT];
    }

    /// All scanlines, top to bottom.
    pub fn rows(&self) -> &[u64; HEIGHT] {
        &self.rows
    }

    /// One packed scanline. `y` wraps.
    pub fn row(&self, y: usize) -> u64 {
        self.rows[y % HEIGHT]
    }

    /// Whether the pixel at (x, y) is lit. Coordinates wrap.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.row(y) >> (x % WIDTH) & 1 == 1
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> u32 {
        self.rows.iter().map(|r| r.count_ones()).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|r| *r == 0)
    }

    /// XOR a sprite onto the display with its top-left corner at (x, y).
    ///
    /// Coordinates are reduced modulo the display size first. Rows past the
    /// bottom edge wrap to the top; pixels past the right edge wrap to
    /// column 0 of the same row. Returns true if any lit pixel was turned
    /// off, across every row of the sprite.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x = x as usize % WIDTH;
        let y = y as usize % HEIGHT;

        let mut collision = false;
        for (i, &bits) in sprite.iter().enumerate() {
            let row = (y + i) % HEIGHT;
            collision |= self.composite_row(row, x, bits);
        }
        collision
    }

    /// XOR one 8-pixel sprite row into scanline `row` at column `x`.
    ///
    /// When `x > 56` the row is split: the first `64 - x` pixels land at
    /// x..63 and the remaining `x - 56` at 0.., which is exactly a rotation
    /// of the packed row.
    fn composite_row(&mut self, row: usize, x: usize, bits: u8) -> bool {
        let mask = row_mask(bits, x);
        let hit = self.rows[row] & mask != 0;
        self.rows[row] ^= mask;
        hit
    }
}

/// Place a sprite byte (MSB = leftmost pixel) into a scanline at column `x`.
fn row_mask(bits: u8, x: usize) -> u64 {
    // bit 0 is the leftmost pixel on screen, so flip the byte first
    u64::from(bits.reverse_bits()).rotate_left(x as u32)
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("lit_pixels", &self.lit_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_mask_bit_order() {
        // leftmost sprite pixel lands on bit x
        assert_eq!(row_mask(0x80, 0), 1);
        assert_eq!(row_mask(0x80, 10), 1 << 10);
        assert_eq!(row_mask(0x01, 0), 1 << 7);
        assert_eq!(row_mask(0xFF, 56), 0xFF << 56);
    }

    #[test]
    fn test_draw_in_bounds() {
        let mut display = Display::new();
        let hit = display.draw_sprite(3, 4, &[0xFF]);

        assert!(!hit);
        assert_eq!(display.row(4), 0xFF << 3);
        assert_eq!(display.lit_count(), 8);
    }

    #[test]
    fn test_draw_wraps_horizontally() {
        let mut display = Display::new();
        // 1010_0101 at x = 60: pixels 0..3 at 60..63, pixels 4..7 at 0..3
        display.draw_sprite(60, 0, &[0b1010_0101]);

        assert!(display.pixel(60, 0));
        assert!(!display.pixel(61, 0));
        assert!(display.pixel(62, 0));
        assert!(!display.pixel(63, 0));
        assert!(!display.pixel(0, 0));
        assert!(display.pixel(1, 0));
        assert!(!display.pixel(2, 0));
        assert!(display.pixel(3, 0));
        assert_eq!(display.lit_count(), 4);
    }

    #[test]
    fn test_draw_wraps_vertically() {
        let mut display = Display::new();
        display.draw_sprite(0, 30, &[0x80, 0x80, 0x80, 0x80]);

        assert!(display.pixel(0, 30));
        assert!(display.pixel(0, 31));
        assert!(display.pixel(0, 0));
        assert!(display.pixel(0, 1));
        assert_eq!(display.lit_count(), 4);
    }

    #[test]
    fn test_coordinates_reduced_modulo_size() {
        let mut a = Display::new();
        let mut b = Display::new();
        a.draw_sprite(70, 40, &[0xC3]);
        b.draw_sprite(6, 8, &[0xC3]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_xor_self_inverse() {
        let mut display = Display::new();
        let sprite = [0xF0, 0x90, 0x90, 0x90, 0xF0];

        assert!(!display.draw_sprite(10, 10, &sprite));
        assert!(display.draw_sprite(10, 10, &sprite));
        assert!(display.is_blank());
    }

    #[test]
    fn test_collision_on_wrapped_half() {
        let mut display = Display::new();
        display.draw_sprite(0, 5, &[0x80]);

        // only the wrapped tail overlaps column 0
        let hit = display.draw_sprite(60, 5, &[0x08]);
        assert!(hit);
        assert!(!display.pixel(0, 5));
    }

    #[test]
    fn test_later_clean_row_keeps_collision() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xFF]);

        // first row collides, second row lands on blank pixels
        let hit = display.draw_sprite(0, 0, &[0x01, 0xFF]);
        assert!(hit);
    }

    #[test]
    fn test_empty_sprite_draws_nothing() {
        let mut display = Display::new();
        assert!(!display.draw_sprite(5, 5, &[]));
        assert!(display.is_blank());
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xFF; 15]);
        display.clear();
        assert!(display.is_blank());
    }
}
