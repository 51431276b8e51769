//! ESC/POS receipt printer driver.
//!
//! A [`Printer`] owns a [`Backend`] (a device file, a TCP connection, or a
//! [`MultiBackend`] fanning out to several printers) and turns every method
//! call into exactly one write of ESC/POS bytes.
//!
//! ```no_run
//! use posprint::{Justification, NetBackend, Printer};
//!
//! let backend = NetBackend::connect("192.168.1.100:9100", None)?;
//! let mut printer = Printer::new(backend);
//! printer.initialize()?;
//! printer.justify(Justification::Center)?;
//! printer.println("Hello")?;
//! printer.cut()?;
//! printer.close()?;
//! # Ok::<(), posprint::Error>(())
//! ```
//!
//! The printer keeps its own print modes (bold, justification, ...);
//! this crate never tracks them. Setting a mode twice sends it twice.

use std::{
	fmt::{self, Debug, Display, Formatter},
	io,
};

macro_rules! backends {
	[$($(# [$($m:tt)*])? $mod:ident :: $name:ident),* $(,)?] => {
		$(
			$(# [$($m)*])*
			mod $mod;
			$(# [$($m)*])*
			pub use crate::$mod::$name;
		)*
	};
}

backends! [
	#[cfg(feature = "file")]
	file::FileBackend,
	#[cfg(feature = "net")]
	net::NetBackend,
	multi::MultiBackend,
];

pub mod bitimage;
pub mod command;
mod error;
mod grid;
pub mod raster;

pub use crate::{
	bitimage::BitImageMode,
	command::{CutMode, Font, Justification, Underline},
	error::{Error, Result},
	grid::{luma, over_white, Bitmap, PixelGrid, INK_THRESHOLD},
	raster::{Density, RasterBlock},
};

#[cfg(feature = "net")]
pub use crate::net::DEFAULT_PORT;

/// A duplex byte stream to one or more printers.
pub trait Backend {
	/// Send data to the printer.
	///
	/// # Return value
	/// The number of bytes accepted, anything short of `buf.len()` is a failure.
	fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

	/// Receive at most `buf.len()` bytes of data from the printer.
	///
	/// # Return value
	/// This functions the number of bytes received from the printer.
	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

	/// Release the underlying device or connection.
	fn close(&mut self) -> io::Result<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
	fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
		(**self).send(buf)
	}

	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		(**self).recv(buf)
	}

	fn close(&mut self) -> io::Result<()> {
		(**self).close()
	}
}

/// Limits applied to images, see [`Printer::with_config()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// Printable width in dots. (576 dots = 72mm on 80mm paper)
	pub max_width: u32,

	/// Rows per raster command.
	pub band_height: u32,
}

impl Config {
	pub const DEFAULT_MAX_WIDTH: u32 = 576;
	pub const DEFAULT_BAND_HEIGHT: u32 = 255;

	pub fn with_max_width(mut self, dots: u32) -> Self {
		self.max_width = dots;
		self
	}

	pub fn with_band_height(mut self, rows: u32) -> Self {
		self.band_height = rows;
		self
	}

	fn validate(&self) -> Result<()> {
		if self.max_width == 0 {
			return Err(Error::invalid("max width", self.max_width, "must be at least 1"));
		}
		if !(1..=raster::MAX_BAND_HEIGHT).contains(&self.band_height) {
			return Err(Error::invalid("band height", self.band_height, "must be between 1 and 4095"));
		}
		Ok(())
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_width: Self::DEFAULT_MAX_WIDTH,
			band_height: Self::DEFAULT_BAND_HEIGHT,
		}
	}
}

/// Answer to `DLE EOT 3`, see [`Printer::transmit_error_status()`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ErrorStatus(pub u8);

impl ErrorStatus {
	pub fn autocutter_error(self) -> bool {
		self.0 & 0x08 != 0
	}

	pub fn unrecoverable_error(self) -> bool {
		self.0 & 0x20 != 0
	}

	pub fn auto_recoverable_error(self) -> bool {
		self.0 & 0x40 != 0
	}
}

/// An ESC/POS printer session.
pub struct Printer {
	backend: Option<Box<dyn Backend>>,
	config: Config,
}

impl Printer {
	/// Construct a new printer using `backend` as it's printing [`Backend`].
	pub fn new(backend: impl Backend + 'static) -> Self {
		Self {
			backend: Some(Box::new(backend)),
			config: Config::default(),
		}
	}

	/// Like [`Printer::new()`], with custom image limits.
	pub fn with_config(backend: impl Backend + 'static, config: Config) -> Result<Self> {
		config.validate()?;
		Ok(Self {
			backend: Some(Box::new(backend)),
			config,
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn is_closed(&self) -> bool {
		self.backend.is_none()
	}

	fn backend(&mut self) -> Result<&mut Box<dyn Backend>> {
		self.backend.as_mut().ok_or(Error::ClosedSession)
	}

	fn send(&mut self, buf: &[u8]) -> Result<()> {
		let backend = self.backend()?;
		log::trace!("send({}{buf:x?});", buf.len());
		let n = backend.send(buf)?;
		if n != buf.len() {
			return Err(io::Error::new(
				io::ErrorKind::WriteZero,
				format!("printer accepted {n} of {} bytes", buf.len()),
			).into());
		}
		Ok(())
	}

	fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
		let n = self.backend()?.recv(buf)?;
		log::trace!("recv({}): {n}{:x?}", buf.len(), &buf[0..n]);
		Ok(n)
	}

	/// Horizontal tab.
	pub fn ht(&mut self) -> Result<()> {
		self.send(&command::ht())
	}

	/// Print the buffer and feed one line.
	pub fn lf(&mut self) -> Result<()> {
		self.send(&command::lf())
	}

	pub fn cr(&mut self) -> Result<()> {
		self.send(&command::cr())
	}

	/// Clear the print buffer and reset all modes to their power-on state.
	pub fn initialize(&mut self) -> Result<()> {
		self.send(&command::initialize())
	}

	/// Feed `n` motion units, `0..=255`.
	pub fn feed(&mut self, n: i32) -> Result<()> {
		let buf = command::feed(n)?;
		self.send(&buf)
	}

	/// Feed `n` lines, `0..=255`.
	pub fn feed_lines(&mut self, n: i32) -> Result<()> {
		let buf = command::feed_lines(n)?;
		self.send(&buf)
	}

	pub fn set_motion_units(&mut self, x: i32, y: i32) -> Result<()> {
		let buf = command::motion_units(x, y)?;
		self.send(&buf)
	}

	/// Set the line spacing to `n` motion units, `0..=255`.
	pub fn set_line_spacing(&mut self, n: i32) -> Result<()> {
		let buf = command::line_spacing(n)?;
		self.send(&buf)
	}

	pub fn reset_line_spacing(&mut self) -> Result<()> {
		self.send(&command::reset_line_spacing())
	}

	/// Set horizontal tab stops, see [`command::tab_stops()`].
	/// Without positions, all tab stops are cleared.
	pub fn set_ht(&mut self, positions: &[i32]) -> Result<()> {
		let buf = command::tab_stops(positions)?;
		self.send(&buf)
	}

	/// Set a tab stop every `width` characters.
	pub fn set_tabs(&mut self, width: i32) -> Result<()> {
		let buf = command::tab_width(width)?;
		self.send(&buf)
	}

	pub fn set_bold(&mut self, on: bool) -> Result<()> {
		self.send(&command::bold(on))
	}

	pub fn set_underline(&mut self, mode: Underline) -> Result<()> {
		self.send(&command::underline(mode))
	}

	/// White on black printing.
	pub fn set_reverse_printing(&mut self, on: bool) -> Result<()> {
		self.send(&command::reverse(on))
	}

	pub fn set_rotate90(&mut self, on: bool) -> Result<()> {
		self.send(&command::rotate90(on))
	}

	pub fn set_upside_down(&mut self, on: bool) -> Result<()> {
		self.send(&command::upside_down(on))
	}

	/// Set the character magnification, `0..=7` each, 0 being normal size.
	pub fn set_char_size(&mut self, width: i32, height: i32) -> Result<()> {
		let buf = command::char_size(width, height)?;
		self.send(&buf)
	}

	pub fn justify(&mut self, j: Justification) -> Result<()> {
		self.send(&command::justify(j))
	}

	pub fn set_font(&mut self, f: Font) -> Result<()> {
		self.send(&command::font(f))
	}

	/// Feed to the cutter and cut the paper.
	pub fn cut(&mut self) -> Result<()> {
		self.send(&command::cut(CutMode::Full))
	}

	/// Like [`Printer::cut()`], but leaves a point uncut.
	pub fn partial_cut(&mut self) -> Result<()> {
		self.send(&command::cut(CutMode::Partial))
	}

	/// Beep `n` times for `t` x 100ms, both `1..=9`.
	pub fn beep(&mut self, n: i32, t: i32) -> Result<()> {
		let buf = command::beep(n, t)?;
		self.send(&buf)
	}

	/// Send bytes as they are.
	pub fn write_raw(&mut self, buf: &[u8]) -> Result<()> {
		self.send(buf)
	}

	/// Print text.
	///
	/// The text is sent as UTF-8, it's up to the caller to only use
	/// characters from the printer's code page.
	pub fn print(&mut self, text: &str) -> Result<()> {
		self.send(text.as_bytes())
	}

	/// Print text followed by a line feed, in a single write.
	pub fn println(&mut self, text: &str) -> Result<()> {
		let mut buf = Vec::with_capacity(text.len() + 1);
		buf.extend_from_slice(text.as_bytes());
		buf.push(command::LF);
		self.send(&buf)
	}

	/// Print formatted text, use with [`format_args!`].
	pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
		let text = fmt::format(args);
		self.print(&text)
	}

	/// Print a picture using raster bit images.
	///
	/// Pictures taller than [`Config::band_height`] are sent as several
	/// raster commands, but still in one write.
	pub fn print_image(&mut self, grid: &impl PixelGrid, density: Density) -> Result<()> {
		self.backend()?;
		let buf: Vec<u8> = raster::encode(grid, density, &self.config)?
			.into_iter()
			.flat_map(RasterBlock::into_bytes)
			.collect();
		self.send(&buf)
	}

	/// Print a picture using column bit images.
	pub fn print_bit_image(&mut self, grid: &impl PixelGrid, mode: BitImageMode) -> Result<()> {
		self.backend()?;
		let buf = bitimage::encode(grid, mode, &self.config)?;
		self.send(&buf)
	}

	/// Query the printer's error status.
	pub fn transmit_error_status(&mut self) -> Result<ErrorStatus> {
		self.send(&command::error_status())?;
		let mut buf = [0u8; 1];
		match self.recv(&mut buf)? {
			0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "printer sent no status").into()),
			_ => Ok(ErrorStatus(buf[0])),
		}
	}

	/// Release the backend. Any later call fails with [`Error::ClosedSession`].
	pub fn close(&mut self) -> Result<()> {
		let mut backend = self.backend.take().ok_or(Error::ClosedSession)?;
		log::debug!("closing printer");
		backend.close()?;
		Ok(())
	}
}

impl Drop for Printer {
	fn drop(&mut self) {
		if let Some(mut backend) = self.backend.take() {
			if let Err(e) = backend.close() {
				log::error!("cannot close printer: {e}");
			}
		}
	}
}

impl Debug for Printer {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f
			.debug_struct("Printer")
			.field("closed", &self.is_closed())
			.field("config", &self.config)
			.finish()
	}
}

impl Display for ErrorStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{:#04x}", self.0)?;
		if self.autocutter_error() {
			f.write_str(" autocutter")?;
		}
		if self.unrecoverable_error() {
			f.write_str(" unrecoverable")?;
		}
		if self.auto_recoverable_error() {
			f.write_str(" auto-recoverable")?;
		}
		Ok(())
	}
}

impl Debug for ErrorStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		<Self as Display>::fmt(self, f)
	}
}
