use std::io;

use thiserror::Error;

/// Errors returned by the encoders and by [`Printer`](crate::Printer).
#[derive(Debug, Error)]
pub enum Error {
	/// A command parameter is outside the range the protocol allows.
	/// Nothing has been sent to the printer.
	#[error("invalid {name}: {value} ({reason})")]
	InvalidParameter {
		name: &'static str,
		value: i64,
		reason: &'static str,
	},

	/// The image does not fit the printer or the raster command.
	#[error("image of {width}x{height} exceeds the maximum width of {max_width} dots")]
	ImageTooLarge {
		width: u32,
		height: u32,
		max_width: u32,
	},

	#[error("printer i/o failed: {0}")]
	Io(#[from] io::Error),

	#[error("printer session is closed")]
	ClosedSession,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
	pub(crate) fn invalid(name: &'static str, value: impl Into<i64>, reason: &'static str) -> Self {
		Self::InvalidParameter {
			name,
			value: value.into(),
			reason,
		}
	}
}
