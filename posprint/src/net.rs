use std::{
	io::{self, Read, Write},
	net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
	time::Duration,
};

use crate::Backend;

/// Raw printing port used by most network receipt printers.
pub const DEFAULT_PORT: u16 = 9100;

/// A TCP backend for [`Printer`](crate::Printer).
///
/// All timeouts live here; the printer session itself never times out.
pub struct NetBackend {
	stream: Option<TcpStream>,
	peer: SocketAddr,
}

impl NetBackend {
	/// Connect to `addr`. A missing port defaults to [`DEFAULT_PORT`].
	pub fn connect(addr: &str, timeout: Option<Duration>) -> io::Result<Self> {
		let addrs = resolve(addr)?;
		let mut last = io::Error::new(io::ErrorKind::InvalidInput, format!("cannot resolve {addr}"));
		for peer in addrs {
			let stream = match timeout {
				Some(t) => TcpStream::connect_timeout(&peer, t),
				None => TcpStream::connect(peer),
			};
			match stream {
				Ok(stream) => {
					stream.set_read_timeout(timeout)?;
					stream.set_write_timeout(timeout)?;
					log::info!("connected to printer at {peer}");
					return Ok(Self::new(stream, peer));
				},
				Err(e) => {
					log::debug!("cannot connect to {peer}: {e}");
					last = e;
				},
			}
		}
		Err(last)
	}

	/// Use an already connected stream.
	pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
		Self {
			stream: Some(stream),
			peer,
		}
	}

	pub fn peer(&self) -> SocketAddr {
		self.peer
	}

	fn stream(&mut self) -> io::Result<&mut TcpStream> {
		self.stream
			.as_mut()
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection is closed"))
	}
}

/// Bare IP literals (including IPv6 ones such as `::1`) get [`DEFAULT_PORT`].
fn resolve(addr: &str) -> io::Result<Vec<SocketAddr>> {
	if let Ok(peer) = addr.parse::<SocketAddr>() {
		return Ok(vec![peer]);
	}
	if let Ok(ip) = addr.parse::<IpAddr>() {
		return Ok(vec![SocketAddr::new(ip, DEFAULT_PORT)]);
	}

	if addr.contains(':') {
		Ok(addr.to_socket_addrs()?.collect())
	} else {
		Ok((addr, DEFAULT_PORT).to_socket_addrs()?.collect())
	}
}

impl Backend for NetBackend {
	fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.stream()?.write_all(buf)?;
		Ok(buf.len())
	}

	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.stream()?.read(buf)
	}

	fn close(&mut self) -> io::Result<()> {
		let Some(stream) = self.stream.take() else {
			return Ok(());
		};

		log::debug!("closing connection to {}", self.peer);
		match stream.shutdown(Shutdown::Both) {
			Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
			_ => Ok(()),
		}
	}
}
