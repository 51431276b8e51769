use std::fmt::{self, Debug, Formatter};

/// Luma strictly below this value is printed as ink.
pub const INK_THRESHOLD: u8 = 0x80;

/// A decoded picture, as consumed by the image encoders.
pub trait PixelGrid {
	fn width(&self) -> u32;
	fn height(&self) -> u32;

	/// Whether the dot at `(x, y)` should be burnt.
	/// Only called with `x < width()` and `y < height()`.
	fn is_ink(&self, x: u32, y: u32) -> bool;
}

impl<G: PixelGrid + ?Sized> PixelGrid for &G {
	fn width(&self) -> u32 {
		(**self).width()
	}

	fn height(&self) -> u32 {
		(**self).height()
	}

	fn is_ink(&self, x: u32, y: u32) -> bool {
		(**self).is_ink(x, y)
	}
}

/// ITU-R BT.601 luma of an RGB color, in integer arithmetic.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
	((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Composite `luma` with alpha `a` over white paper.
pub fn over_white(luma: u8, a: u8) -> u8 {
	let (l, a) = (luma as u32, a as u32);
	((l * a + 255 * (255 - a)) / 255) as u8
}

/// A monochrome picture, one `bool` per dot.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
	width: u32,
	height: u32,
	dots: Vec<bool>,
}

impl Bitmap {
	/// An all-blank bitmap.
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			dots: vec![false; width as usize * height as usize],
		}
	}

	/// Build a bitmap by asking `f` for every dot.
	pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
		let mut bmp = Self::new(width, height);
		for y in 0..height {
			for x in 0..width {
				bmp.set(x, y, f(x, y));
			}
		}
		bmp
	}

	/// Threshold any other grid into a bitmap, optionally inverted.
	pub fn from_grid(grid: &impl PixelGrid, invert: bool) -> Self {
		Self::from_fn(grid.width(), grid.height(), |x, y| grid.is_ink(x, y) ^ invert)
	}

	pub fn get(&self, x: u32, y: u32) -> Option<bool> {
		if x >= self.width || y >= self.height {
			return None;
		}
		Some(self.dots[self.index(x, y)])
	}

	/// Set a dot. Out of bounds coordinates are ignored.
	pub fn set(&mut self, x: u32, y: u32, ink: bool) {
		if x < self.width && y < self.height {
			let i = self.index(x, y);
			self.dots[i] = ink;
		}
	}

	fn index(&self, x: u32, y: u32) -> usize {
		y as usize * self.width as usize + x as usize
	}
}

impl PixelGrid for Bitmap {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn is_ink(&self, x: u32, y: u32) -> bool {
		self.dots[self.index(x, y)]
	}
}

impl Debug for Bitmap {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f
			.debug_struct("Bitmap")
			.field("width", &self.width)
			.field("height", &self.height)
			.finish()
	}
}

#[cfg(feature = "image")]
mod image_impls {
	use image::{DynamicImage, GenericImageView, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

	use super::*;

	impl PixelGrid for GrayImage {
		fn width(&self) -> u32 {
			self.width()
		}

		fn height(&self) -> u32 {
			self.height()
		}

		fn is_ink(&self, x: u32, y: u32) -> bool {
			self.get_pixel(x, y).0[0] < INK_THRESHOLD
		}
	}

	impl PixelGrid for GrayAlphaImage {
		fn width(&self) -> u32 {
			self.width()
		}

		fn height(&self) -> u32 {
			self.height()
		}

		fn is_ink(&self, x: u32, y: u32) -> bool {
			let [l, a] = self.get_pixel(x, y).0;
			over_white(l, a) < INK_THRESHOLD
		}
	}

	impl PixelGrid for RgbImage {
		fn width(&self) -> u32 {
			self.width()
		}

		fn height(&self) -> u32 {
			self.height()
		}

		fn is_ink(&self, x: u32, y: u32) -> bool {
			let [r, g, b] = self.get_pixel(x, y).0;
			luma(r, g, b) < INK_THRESHOLD
		}
	}

	impl PixelGrid for RgbaImage {
		fn width(&self) -> u32 {
			self.width()
		}

		fn height(&self) -> u32 {
			self.height()
		}

		fn is_ink(&self, x: u32, y: u32) -> bool {
			let [r, g, b, a] = self.get_pixel(x, y).0;
			over_white(luma(r, g, b), a) < INK_THRESHOLD
		}
	}

	impl PixelGrid for DynamicImage {
		fn width(&self) -> u32 {
			GenericImageView::width(self)
		}

		fn height(&self) -> u32 {
			GenericImageView::height(self)
		}

		fn is_ink(&self, x: u32, y: u32) -> bool {
			let [r, g, b, a] = self.get_pixel(x, y).0;
			over_white(luma(r, g, b), a) < INK_THRESHOLD
		}
	}
}
