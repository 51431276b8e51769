use std::io;

use crate::{Backend, Error, Result};

/// Replicates everything to several printers, one after another.
///
/// Backends are used in the order they were given. Writes and reads stop at
/// the first failing backend; backends before it have already seen the data.
/// A backend that accepts only part of a write counts as failing.
pub struct MultiBackend {
	backends: Vec<Box<dyn Backend>>,
}

impl MultiBackend {
	/// Fails if `backends` is empty.
	pub fn new(backends: Vec<Box<dyn Backend>>) -> Result<Self> {
		if backends.is_empty() {
			return Err(Error::invalid("backend count", 0, "need at least one backend"));
		}

		Ok(Self {
			backends,
		})
	}

	pub fn len(&self) -> usize {
		self.backends.len()
	}

	pub fn is_empty(&self) -> bool {
		self.backends.is_empty()
	}
}

impl Backend for MultiBackend {
	fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
		for (i, backend) in self.backends.iter_mut().enumerate() {
			let n = match backend.send(buf) {
				Ok(n) => n,
				Err(e) => {
					log::debug!("send to backend {i} failed: {e}");
					return Err(e);
				},
			};
			if n != buf.len() {
				log::debug!("backend {i} accepted {n} of {} bytes", buf.len());
				return Err(io::Error::new(
					io::ErrorKind::WriteZero,
					format!("backend {i} accepted {n} of {} bytes", buf.len()),
				));
			}
		}
		Ok(buf.len())
	}

	/// Every backend reads into the same buffer, so only the last answer is kept.
	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let mut n = 0;
		for backend in &mut self.backends {
			n = backend.recv(buf)?;
		}
		Ok(n)
	}

	fn close(&mut self) -> io::Result<()> {
		let mut first = None;
		for (i, backend) in self.backends.iter_mut().enumerate() {
			if let Err(e) = backend.close() {
				log::error!("cannot close backend {i}: {e}");
				first.get_or_insert(e);
			}
		}
		first.map_or(Ok(()), Err)
	}
}

#[cfg(test)]
mod tests {
	use std::{cell::RefCell, rc::Rc};

	use super::*;

	#[derive(Default)]
	struct Log {
		sent: Vec<u8>,
		closed: bool,
	}

	struct Fake {
		log: Rc<RefCell<Log>>,
		fail: bool,
		short: bool,
		answer: u8,
	}

	impl Backend for Fake {
		fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
			if self.fail {
				return Err(io::Error::other("send failed"));
			}
			let n = if self.short { buf.len() / 2 } else { buf.len() };
			self.log.borrow_mut().sent.extend_from_slice(&buf[..n]);
			Ok(n)
		}

		fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			if self.fail {
				return Err(io::Error::other("recv failed"));
			}
			buf[0] = self.answer;
			Ok(1)
		}

		fn close(&mut self) -> io::Result<()> {
			self.log.borrow_mut().closed = true;
			if self.fail {
				return Err(io::Error::other("close failed"));
			}
			Ok(())
		}
	}

	fn fake(fail: bool, answer: u8) -> (Rc<RefCell<Log>>, Box<dyn Backend>) {
		let log = Rc::new(RefCell::new(Log::default()));
		let backend = Fake {
			log: Rc::clone(&log),
			fail,
			short: false,
			answer,
		};
		(log, Box::new(backend))
	}

	fn half() -> (Rc<RefCell<Log>>, Box<dyn Backend>) {
		let log = Rc::new(RefCell::new(Log::default()));
		let backend = Fake {
			log: Rc::clone(&log),
			fail: false,
			short: true,
			answer: 0,
		};
		(log, Box::new(backend))
	}

	#[test]
	fn empty_rejected() {
		assert!(matches!(MultiBackend::new(Vec::new()), Err(Error::InvalidParameter { .. })));
	}

	#[test]
	fn send_to_all() {
		let (a, ba) = fake(false, 0);
		let (b, bb) = fake(false, 0);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		assert_eq!(multi.len(), 2);
		assert_eq!(multi.send(b"abc").unwrap(), 3);
		assert_eq!(a.borrow().sent, b"abc");
		assert_eq!(b.borrow().sent, b"abc");
	}

	#[test]
	fn first_failure_stops_send() {
		let (_, ba) = fake(true, 0);
		let (b, bb) = fake(false, 0);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		assert!(multi.send(b"abc").is_err());
		assert!(b.borrow().sent.is_empty());
	}

	#[test]
	fn later_failure_keeps_earlier_writes() {
		let (a, ba) = fake(false, 0);
		let (_, bb) = fake(true, 0);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		assert!(multi.send(b"abc").is_err());
		assert_eq!(a.borrow().sent, b"abc");
	}

	#[test]
	fn short_write_stops_send() {
		let (a, ba) = half();
		let (b, bb) = fake(false, 0);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		let err = multi.send(b"abcdef").unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::WriteZero);
		assert_eq!(a.borrow().sent, b"abc");
		assert!(b.borrow().sent.is_empty());

		let (a, ba) = fake(false, 0);
		let (_, bb) = half();
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		assert_eq!(multi.send(b"abcd").unwrap_err().kind(), io::ErrorKind::WriteZero);
		assert_eq!(a.borrow().sent, b"abcd");
	}

	#[test]
	fn recv_keeps_last() {
		let (_, ba) = fake(false, 1);
		let (_, bb) = fake(false, 2);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		let mut buf = [0u8; 1];
		assert_eq!(multi.recv(&mut buf).unwrap(), 1);
		assert_eq!(buf, [2]);

		let (_, ba) = fake(true, 1);
		let (_, bb) = fake(false, 2);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		assert!(multi.recv(&mut buf).is_err());
	}

	#[test]
	fn close_continues_after_failure() {
		let (a, ba) = fake(true, 0);
		let (b, bb) = fake(false, 0);
		let mut multi = MultiBackend::new(vec![ba, bb]).unwrap();
		let err = multi.close().unwrap_err();
		assert_eq!(err.to_string(), "close failed");
		assert!(a.borrow().closed);
		assert!(b.borrow().closed);
	}
}
