//! Raster bit images (`GS v 0`).
//!
//! # Format
//! - one bit per dot, 1 = ink
//! - rows of `ceil(width / 8)` bytes, MSB is the leftmost dot
//! - unused bits at the end of a row are always 0
//! - at most [`MAX_WIDTH_BYTES`] bytes per row and [`MAX_BAND_HEIGHT`] rows per command

use std::fmt::{self, Debug, Formatter};

use crate::{command::GS, Config, Error, PixelGrid, Result};

/// Largest `xL + xH * 256` accepted by `GS v 0`.
pub const MAX_WIDTH_BYTES: u32 = 128;

/// Largest `yL + yH * 256` accepted by `GS v 0`.
pub const MAX_BAND_HEIGHT: u32 = 4095;

/// Dot density of a raster image, the `m` parameter of `GS v 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Density {
	/// 1:1
	#[default]
	Normal,
	DoubleWidth,
	DoubleHeight,
	/// Double width and double height.
	Quadruple,
}

impl Density {
	pub fn byte(self) -> u8 {
		match self {
			Self::Normal => 0,
			Self::DoubleWidth => 1,
			Self::DoubleHeight => 2,
			Self::Quadruple => 3,
		}
	}
}

/// One complete `GS v 0` command.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterBlock {
	bytes: Vec<u8>,
}

impl RasterBlock {
	const HEADER: usize = 8;

	pub fn density(&self) -> u8 {
		self.bytes[3]
	}

	/// Bytes per row.
	pub fn width_bytes(&self) -> usize {
		u16::from_le_bytes([self.bytes[4], self.bytes[5]]) as usize
	}

	/// Number of rows.
	pub fn height(&self) -> usize {
		u16::from_le_bytes([self.bytes[6], self.bytes[7]]) as usize
	}

	pub fn header(&self) -> &[u8] {
		&self.bytes[..Self::HEADER]
	}

	/// Packed rows, without the header.
	pub fn payload(&self) -> &[u8] {
		&self.bytes[Self::HEADER..]
	}

	/// The whole command, ready to be sent.
	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}
}

impl Debug for RasterBlock {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f
			.debug_struct("RasterBlock")
			.field("density", &self.density())
			.field("width_bytes", &self.width_bytes())
			.field("height", &self.height())
			.finish()
	}
}

/// Check the grid dimensions against `config` and the protocol limits.
pub(crate) fn check_size(grid: &impl PixelGrid, max_width: u32) -> Result<(u32, u32)> {
	let (w, h) = (grid.width(), grid.height());
	if w == 0 {
		return Err(Error::invalid("image width", w, "image is empty"));
	}
	if h == 0 {
		return Err(Error::invalid("image height", h, "image is empty"));
	}
	if w > max_width {
		return Err(Error::ImageTooLarge {
			width: w,
			height: h,
			max_width,
		});
	}
	Ok((w, h))
}

/// Pack a single row, MSB first.
pub fn pack_row(grid: &impl PixelGrid, y: u32, out: &mut Vec<u8>) {
	let w = grid.width();
	let mut x = 0;
	while x < w {
		let b = (0..8)
			.filter(|i| x + i < w && grid.is_ink(x + i, y))
			.fold(0u8, |acc, i| acc | (0x80 >> i));
		out.push(b);
		x += 8;
	}
}

/// Encode `grid` into one or more raster commands,
/// each at most `config.band_height` rows tall.
pub fn encode(grid: &impl PixelGrid, density: Density, config: &Config) -> Result<Vec<RasterBlock>> {
	let max_width = config.max_width.min(MAX_WIDTH_BYTES * 8);
	let (w, h) = check_size(grid, max_width)?;
	let band = config.band_height.clamp(1, MAX_BAND_HEIGHT);
	let rs = w.div_ceil(8);

	log::debug!("raster {w}x{h}, {rs} bytes per row, bands of {band} rows, density {density:?}");

	let blocks = (0..h)
		.step_by(band as usize)
		.map(|top| {
			let rows = band.min(h - top);
			let mut bytes = Vec::with_capacity(RasterBlock::HEADER + (rs * rows) as usize);
			bytes.extend_from_slice(&[GS, b'v', b'0', density.byte()]);
			bytes.extend_from_slice(&(rs as u16).to_le_bytes());
			bytes.extend_from_slice(&(rows as u16).to_le_bytes());
			for y in top..top + rows {
				pack_row(grid, y, &mut bytes);
			}
			RasterBlock { bytes }
		})
		.collect();

	Ok(blocks)
}
