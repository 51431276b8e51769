use std::{
	fs::{File, OpenOptions},
	io::{self, Read, Write},
	path::Path,
};

use crate::Backend;

/// A device file backend for [`Printer`](crate::Printer),
/// e.g. `/dev/usb/lp0` or a serial port.
pub struct FileBackend {
	file: Option<File>,
}

impl FileBackend {
	/// Open a printing device for reading and writing.
	pub fn open(path: &Path) -> io::Result<Self> {
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.open(path)?;
		log::debug!("opened printer device {}", path.display());
		Ok(Self::new(file))
	}

	/// Use an already opened file.
	pub fn new(file: File) -> Self {
		Self {
			file: Some(file),
		}
	}

	fn file(&mut self) -> io::Result<&mut File> {
		self.file
			.as_mut()
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "device is closed"))
	}
}

impl Backend for FileBackend {
	fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
		let file = self.file()?;
		file.write_all(buf)?;
		file.flush()?;
		Ok(buf.len())
	}

	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.file()?.read(buf)
	}

	fn close(&mut self) -> io::Result<()> {
		match self.file.take() {
			Some(mut file) => file.flush(),
			None => Ok(()),
		}
	}
}
