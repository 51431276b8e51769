//! ESC/POS command encoding.
//!
//! Every function here is pure: it only builds the bytes for one command.
//! Parameters are checked before anything is built, so a rejected command
//! never produces output.

use std::ops::RangeInclusive;

use crate::{Error, Result};

pub const HT: u8 = 0x09;
pub const LF: u8 = 0x0a;
pub const CR: u8 = 0x0d;
pub const DLE: u8 = 0x10;
pub const EOT: u8 = 0x04;
pub const ESC: u8 = 0x1b;
pub const GS: u8 = 0x1d;
pub const NUL: u8 = 0x00;

/// Maximum number of horizontal tab stops accepted by `ESC D`.
pub const MAX_TAB_STOPS: usize = 32;

/// Text alignment, see [`justify()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Justification {
	#[default]
	Left,
	Center,
	Right,
}

impl Justification {
	pub fn byte(self) -> u8 {
		match self {
			Self::Left => 0,
			Self::Center => 1,
			Self::Right => 2,
		}
	}
}

/// Character font, see [`font()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Font {
	/// 12x24 on most printers.
	#[default]
	A,
	/// 9x17 on most printers.
	B,
}

impl Font {
	pub fn byte(self) -> u8 {
		match self {
			Self::A => 0,
			Self::B => 1,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Underline {
	#[default]
	Off,
	Single,
	Double,
}

impl Underline {
	pub fn byte(self) -> u8 {
		match self {
			Self::Off => 0,
			Self::Single => 1,
			Self::Double => 2,
		}
	}
}

/// Paper cut, see [`cut()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CutMode {
	#[default]
	Full,
	Partial,
}

impl CutMode {
	/// Function B of `GS V`: feed to the cutting position, then cut.
	pub fn byte(self) -> u8 {
		match self {
			Self::Full => 65,
			Self::Partial => 66,
		}
	}
}

fn param(name: &'static str, value: i32, range: RangeInclusive<i32>) -> Result<u8> {
	if !range.contains(&value) {
		return Err(Error::invalid(name, value, "out of range"));
	}

	// every range passed in here fits in a byte
	u8::try_from(value).map_err(|_| Error::invalid(name, value, "does not fit in a byte"))
}

fn flag(b: bool) -> u8 {
	b as u8
}

pub fn ht() -> [u8; 1] {
	[HT]
}

pub fn lf() -> [u8; 1] {
	[LF]
}

pub fn cr() -> [u8; 1] {
	[CR]
}

/// `ESC @`: clear the print buffer and restore the power-on modes.
pub fn initialize() -> [u8; 2] {
	[ESC, b'@']
}

/// `ESC J n`: print and feed `n` motion units (see [`motion_units()`]).
pub fn feed(n: i32) -> Result<[u8; 3]> {
	let n = param("feed units", n, 0..=255)?;
	Ok([ESC, b'J', n])
}

/// `ESC d n`: print and feed `n` lines.
pub fn feed_lines(n: i32) -> Result<[u8; 3]> {
	let n = param("feed lines", n, 0..=255)?;
	Ok([ESC, b'd', n])
}

/// `GS P x y`: horizontal and vertical motion units, `1/x` and `1/y` inch.
/// Zero restores the printer's default.
pub fn motion_units(x: i32, y: i32) -> Result<[u8; 4]> {
	let x = param("horizontal motion unit", x, 0..=255)?;
	let y = param("vertical motion unit", y, 0..=255)?;
	Ok([GS, b'P', x, y])
}

/// `ESC 3 n`: line spacing in motion units.
pub fn line_spacing(n: i32) -> Result<[u8; 3]> {
	let n = param("line spacing", n, 0..=255)?;
	Ok([ESC, b'3', n])
}

/// `ESC 2`: default line spacing.
pub fn reset_line_spacing() -> [u8; 2] {
	[ESC, b'2']
}

/// `ESC D p1 .. pk NUL`: set horizontal tab stops, in character columns.
///
/// Positions must be strictly increasing, between 1 and 255, and at most
/// [`MAX_TAB_STOPS`] of them. An empty list clears all tab stops.
pub fn tab_stops(positions: &[i32]) -> Result<Vec<u8>> {
	if positions.len() > MAX_TAB_STOPS {
		return Err(Error::invalid("tab stop count", positions.len() as i64, "at most 32 tab stops"));
	}

	let mut buf = Vec::with_capacity(positions.len() + 3);
	buf.extend_from_slice(&[ESC, b'D']);

	let mut last = 0;
	for &p in positions {
		let b = param("tab stop", p, 1..=255)?;
		if b <= last {
			return Err(Error::invalid("tab stop", p, "tab stops must be strictly increasing"));
		}
		buf.push(b);
		last = b;
	}

	buf.push(NUL);
	Ok(buf)
}

/// Tab stops every `width` columns, as many as `ESC D` takes.
pub fn tab_width(width: i32) -> Result<Vec<u8>> {
	if !(1..=255).contains(&width) {
		return Err(Error::invalid("tab width", width, "must be between 1 and 255"));
	}

	let positions: Vec<i32> = (1..)
		.map(|i| i * width)
		.take_while(|&p| p <= 255)
		.take(MAX_TAB_STOPS)
		.collect();
	tab_stops(&positions)
}

/// `ESC E n`
pub fn bold(on: bool) -> [u8; 3] {
	[ESC, b'E', flag(on)]
}

/// `ESC - n`
pub fn underline(mode: Underline) -> [u8; 3] {
	[ESC, b'-', mode.byte()]
}

/// `GS B n`: white on black printing.
pub fn reverse(on: bool) -> [u8; 3] {
	[GS, b'B', flag(on)]
}

/// `ESC V n`: 90° clockwise rotation.
pub fn rotate90(on: bool) -> [u8; 3] {
	[ESC, b'V', flag(on)]
}

/// `ESC { n`
pub fn upside_down(on: bool) -> [u8; 3] {
	[ESC, b'{', flag(on)]
}

/// `GS ! n`: character magnification.
///
/// `width` and `height` are the magnification minus one, `0..=7` each.
/// The width goes into the high nibble, the height into the low one.
pub fn char_size(width: i32, height: i32) -> Result<[u8; 3]> {
	let w = param("character width", width, 0..=7)?;
	let h = param("character height", height, 0..=7)?;
	Ok([GS, b'!', (w << 4) | h])
}

/// `ESC a n`
pub fn justify(j: Justification) -> [u8; 3] {
	[ESC, b'a', j.byte()]
}

/// `ESC M n`
pub fn font(f: Font) -> [u8; 3] {
	[ESC, b'M', f.byte()]
}

/// `GS V m 0`: feed to the cutter and cut.
pub fn cut(mode: CutMode) -> [u8; 4] {
	[GS, b'V', mode.byte(), 0]
}

/// `ESC ( A`: sound the buzzer `n` times for `t` x 100ms each.
pub fn beep(n: i32, t: i32) -> Result<[u8; 9]> {
	let n = param("beep count", n, 1..=9)?;
	let t = param("beep duration", t, 1..=9)?;
	Ok([ESC, b'(', b'A', 4, 0, 48, n, t, 0])
}

/// `DLE EOT 3`: transmit the error status byte.
pub fn error_status() -> [u8; 3] {
	[DLE, EOT, 3]
}
