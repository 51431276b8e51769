//! Column bit images (`ESC *`).
//!
//! The picture is cut into horizontal stripes of 8 or 24 dots. Each stripe is
//! sent as one `ESC *` command followed by a line feed, with the line spacing
//! set so that consecutive stripes touch.

use crate::{
	command::{self, ESC, LF},
	raster::check_size,
	Config,
	PixelGrid,
	Result,
};

/// Largest `nL + nH * 256` accepted by `ESC *`.
pub const MAX_WIDTH: u32 = 2047;

/// Line spacing that makes stripes touch, in default vertical motion units (1/180").
const STRIPE_SPACING: i32 = 24;

/// Dot density and stripe height, the `m` parameter of `ESC *`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BitImageMode {
	/// 8-dot, single horizontal density.
	Single8,
	/// 8-dot, double horizontal density.
	Double8,
	/// 24-dot, single horizontal density.
	Single24,
	/// 24-dot, double horizontal density.
	#[default]
	Double24,
}

impl BitImageMode {
	pub fn byte(self) -> u8 {
		match self {
			Self::Single8 => 0,
			Self::Double8 => 1,
			Self::Single24 => 32,
			Self::Double24 => 33,
		}
	}

	/// Dots per stripe.
	pub fn stripe_height(self) -> u32 {
		match self {
			Self::Single8 | Self::Double8 => 8,
			Self::Single24 | Self::Double24 => 24,
		}
	}
}

/// Encode `grid` as a sequence of `ESC *` stripes, including the line spacing
/// commands around them.
pub fn encode(grid: &impl PixelGrid, mode: BitImageMode, config: &Config) -> Result<Vec<u8>> {
	let (w, h) = check_size(grid, config.max_width.min(MAX_WIDTH))?;
	let stripe = mode.stripe_height();
	let bytes_per_column = (stripe / 8) as usize;
	let stripes = h.div_ceil(stripe);

	log::debug!("bit image {w}x{h}, {stripes} stripes of {stripe} dots, mode {mode:?}");

	let mut buf = Vec::with_capacity(6 + stripes as usize * (6 + w as usize * bytes_per_column));
	buf.extend_from_slice(&command::line_spacing(STRIPE_SPACING)?);

	for s in 0..stripes {
		let top = s * stripe;
		buf.extend_from_slice(&[ESC, b'*', mode.byte()]);
		buf.extend_from_slice(&(w as u16).to_le_bytes());
		for x in 0..w {
			for k in 0..bytes_per_column as u32 {
				let b = (0..8)
					.map(|i| top + k * 8 + i)
					.enumerate()
					.filter(|&(_, y)| y < h && grid.is_ink(x, y))
					.fold(0u8, |acc, (i, _)| acc | (0x80 >> i));
				buf.push(b);
			}
		}
		buf.push(LF);
	}

	buf.extend_from_slice(&command::reset_line_spacing());
	Ok(buf)
}
