use std::{cell::RefCell, io, rc::Rc};

use posprint::{
	Backend, BitImageMode, Bitmap, Config, Density, Error, Font, Justification, MultiBackend, Printer, Underline,
};

#[derive(Default)]
struct Wire {
	sent: Vec<u8>,
	sends: usize,
	recvs: usize,
	closes: usize,
	answer: Vec<u8>,
	fail_send: bool,
	short_send: bool,
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Wire>>);

impl Recorder {
	fn answering(answer: &[u8]) -> Self {
		let r = Self::default();
		r.0.borrow_mut().answer = answer.to_vec();
		r
	}

	fn failing() -> Self {
		let r = Self::default();
		r.0.borrow_mut().fail_send = true;
		r
	}

	fn short() -> Self {
		let r = Self::default();
		r.0.borrow_mut().short_send = true;
		r
	}

	fn sent(&self) -> Vec<u8> {
		self.0.borrow().sent.clone()
	}

	fn io_calls(&self) -> usize {
		let w = self.0.borrow();
		w.sends + w.recvs + w.closes
	}
}

impl Backend for Recorder {
	fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
		let mut w = self.0.borrow_mut();
		w.sends += 1;
		if w.fail_send {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
		}
		let n = if w.short_send { buf.len() / 2 } else { buf.len() };
		w.sent.extend_from_slice(&buf[..n]);
		Ok(n)
	}

	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let mut w = self.0.borrow_mut();
		w.recvs += 1;
		let n = w.answer.len().min(buf.len());
		buf[..n].copy_from_slice(&w.answer[..n]);
		let rest = w.answer.split_off(n);
		w.answer = rest;
		Ok(n)
	}

	fn close(&mut self) -> io::Result<()> {
		self.0.borrow_mut().closes += 1;
		Ok(())
	}
}

fn printer() -> (Recorder, Printer) {
	let rec = Recorder::default();
	(rec.clone(), Printer::new(rec))
}

#[test]
fn single_byte_commands() {
	type Command = fn(&mut Printer) -> posprint::Result<()>;
	let commands: [(Command, u8); 3] = [
		(Printer::ht, 0x09),
		(Printer::lf, 0x0a),
		(Printer::cr, 0x0d),
	];
	for (f, expected) in commands {
		let (rec, mut p) = printer();
		f(&mut p).unwrap();
		assert_eq!(rec.sent(), [expected]);
	}
}

#[test]
fn initialize() {
	let (rec, mut p) = printer();
	p.initialize().unwrap();
	assert_eq!(rec.sent(), [0x1b, 0x40]);
}

#[test]
fn write_raw_is_verbatim() {
	let inputs: [&[u8]; 4] = [b"", b"Test", &[0x00, 0x1b, 0xff, 0x0a], &[0x80; 300]];
	for input in inputs {
		let (rec, mut p) = printer();
		p.write_raw(input).unwrap();
		assert_eq!(rec.sent(), input);
	}
}

#[test]
fn print_is_verbatim() {
	for s in ["", "Test", "Grüße\t€", "a\nb"] {
		let (rec, mut p) = printer();
		p.print(s).unwrap();
		assert_eq!(rec.sent(), s.as_bytes());
	}
}

#[test]
fn println_appends_one_lf() {
	for s in ["", "Test", "line\n", "Ω"] {
		let (rec, mut p) = printer();
		p.println(s).unwrap();
		let mut expected = s.as_bytes().to_vec();
		expected.push(0x0a);
		assert_eq!(rec.sent(), expected);
		assert_eq!(rec.0.borrow().sends, 1);
	}
}

#[test]
fn print_fmt_matches_format() {
	for s in ["Test", "", "%d {}"] {
		let (rec, mut p) = printer();
		p.print_fmt(format_args!("{s} {} {}", 1, 2)).unwrap();
		assert_eq!(rec.sent(), format!("{s} {} {}", 1, 2).into_bytes());
	}
}

#[test]
fn char_size_boundaries() {
	let (rec, mut p) = printer();
	p.set_char_size(0, 0).unwrap();
	p.set_char_size(7, 7).unwrap();
	assert_eq!(rec.sent(), [0x1d, 0x21, 0x00, 0x1d, 0x21, 0x77]);

	let (rec, mut p) = printer();
	for (w, h) in [(8, 0), (0, 8), (-1, 0), (0, -1)] {
		assert!(matches!(p.set_char_size(w, h), Err(Error::InvalidParameter { .. })));
	}
	assert_eq!(rec.io_calls(), 0);
}

#[test]
fn rejected_parameters_send_nothing() {
	let (rec, mut p) = printer();
	assert!(p.feed(256).is_err());
	assert!(p.feed_lines(-1).is_err());
	assert!(p.set_line_spacing(300).is_err());
	assert!(p.set_ht(&[8, 8]).is_err());
	assert!(p.set_tabs(0).is_err());
	assert!(p.set_tabs(300).is_err());
	assert!(p.beep(0, 1).is_err());
	assert!(p.set_motion_units(256, 0).is_err());
	assert_eq!(rec.io_calls(), 0);
}

#[test]
fn setters_are_not_deduplicated() {
	let (rec, mut p) = printer();
	p.set_bold(true).unwrap();
	p.set_bold(true).unwrap();
	assert_eq!(rec.sent(), [0x1b, b'E', 1, 0x1b, b'E', 1]);
}

#[test]
fn one_send_per_command() {
	let (rec, mut p) = printer();
	p.justify(Justification::Center).unwrap();
	p.set_font(Font::B).unwrap();
	p.set_underline(Underline::Single).unwrap();
	p.set_reverse_printing(true).unwrap();
	p.set_rotate90(false).unwrap();
	p.set_upside_down(true).unwrap();
	p.set_ht(&[]).unwrap();
	p.set_tabs(8).unwrap();
	p.feed(10).unwrap();
	p.feed_lines(2).unwrap();
	p.cut().unwrap();
	p.partial_cut().unwrap();
	p.beep(2, 3).unwrap();
	assert_eq!(rec.0.borrow().sends, 13);

	let sent = rec.sent();
	assert_eq!(&sent[..12], &[
		0x1b, b'a', 1,
		0x1b, b'M', 1,
		0x1b, b'-', 1,
		0x1d, b'B', 1,
	]);
}

#[test]
fn raster_image() {
	let (rec, mut p) = printer();
	p.print_image(&Bitmap::from_fn(1, 1, |_, _| true), Density::Normal).unwrap();
	assert_eq!(rec.sent(), [0x1d, 0x76, 0x30, 0x00, 0x01, 0x00, 0x01, 0x00, 0x80]);

	let (rec, mut p) = printer();
	p.print_image(&Bitmap::new(1, 1), Density::Normal).unwrap();
	assert_eq!(rec.sent(), [0x1d, 0x76, 0x30, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn tall_raster_image_single_write() {
	let rec = Recorder::default();
	let config = Config::default().with_band_height(10);
	let mut p = Printer::with_config(rec.clone(), config).unwrap();
	p.print_image(&Bitmap::new(16, 25), Density::Quadruple).unwrap();

	assert_eq!(rec.0.borrow().sends, 1);
	// three blocks: 10 + 10 + 5 rows of 2 bytes
	assert_eq!(rec.sent().len(), 3 * 8 + 25 * 2);
}

#[test]
fn image_errors_send_nothing() {
	let (rec, mut p) = printer();
	assert!(matches!(p.print_image(&Bitmap::new(0, 0), Density::Normal), Err(Error::InvalidParameter { .. })));
	assert!(matches!(
		p.print_image(&Bitmap::new(1000, 1), Density::Normal),
		Err(Error::ImageTooLarge { .. })
	));
	assert!(matches!(
		p.print_bit_image(&Bitmap::new(1000, 1), BitImageMode::Double24),
		Err(Error::ImageTooLarge { .. })
	));
	assert_eq!(rec.io_calls(), 0);
}

#[test]
fn invalid_config() {
	assert!(Printer::with_config(Recorder::default(), Config::default().with_band_height(0)).is_err());
	assert!(Printer::with_config(Recorder::default(), Config::default().with_band_height(5000)).is_err());
	assert!(Printer::with_config(Recorder::default(), Config::default().with_max_width(0)).is_err());
}

#[test]
fn error_status() {
	let rec = Recorder::answering(&[0x48]);
	let mut p = Printer::new(rec.clone());
	let status = p.transmit_error_status().unwrap();
	assert_eq!(status.0, 0x48);
	assert!(status.autocutter_error());
	assert!(status.auto_recoverable_error());
	assert!(!status.unrecoverable_error());
	assert_eq!(rec.sent(), [0x10, 0x04, 0x03]);
}

#[test]
fn error_status_short_read() {
	let (_, mut p) = printer();
	match p.transmit_error_status() {
		Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
		other => panic!("unexpected result: {other:?}"),
	}
}

#[test]
fn send_error_is_passed_through() {
	let mut p = Printer::new(Recorder::failing());
	match p.println("x") {
		Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
		other => panic!("unexpected result: {other:?}"),
	}
}

#[test]
fn closed_session() {
	let (rec, mut p) = printer();
	p.close().unwrap();
	assert!(p.is_closed());
	assert_eq!(rec.io_calls(), 1);

	assert!(matches!(p.close(), Err(Error::ClosedSession)));
	assert!(matches!(p.lf(), Err(Error::ClosedSession)));
	assert!(matches!(p.write_raw(b"x"), Err(Error::ClosedSession)));
	assert!(matches!(p.transmit_error_status(), Err(Error::ClosedSession)));
	assert!(matches!(p.print_image(&Bitmap::new(0, 0), Density::Normal), Err(Error::ClosedSession)));
	assert_eq!(rec.io_calls(), 1);

	drop(p);
	assert_eq!(rec.io_calls(), 1);
}

#[test]
fn drop_closes() {
	let (rec, p) = printer();
	drop(p);
	assert_eq!(rec.0.borrow().closes, 1);
}

#[test]
fn fan_out_session() {
	let a = Recorder::default();
	let b = Recorder::default();
	let backends: Vec<Box<dyn Backend>> = vec![Box::new(a.clone()), Box::new(b.clone())];
	let multi = MultiBackend::new(backends).unwrap();
	let mut p = Printer::new(multi);
	p.println("hi").unwrap();
	p.close().unwrap();

	assert_eq!(a.sent(), b"hi\n");
	assert_eq!(b.sent(), b"hi\n");
	assert_eq!(a.0.borrow().closes, 1);
	assert_eq!(b.0.borrow().closes, 1);
}

#[test]
fn fan_out_first_failure() {
	let a = Recorder::failing();
	let b = Recorder::default();
	let backends: Vec<Box<dyn Backend>> = vec![Box::new(a), Box::new(b.clone())];
	let multi = MultiBackend::new(backends).unwrap();
	let mut p = Printer::new(multi);
	assert!(p.println("hi").is_err());
	assert!(b.sent().is_empty());
}

#[test]
fn short_write_is_an_error() {
	let mut p = Printer::new(Recorder::short());
	match p.println("hello") {
		Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
		other => panic!("unexpected result: {other:?}"),
	}

	let a = Recorder::short();
	let b = Recorder::default();
	let backends: Vec<Box<dyn Backend>> = vec![Box::new(a.clone()), Box::new(b.clone())];
	let mut p = Printer::new(MultiBackend::new(backends).unwrap());
	match p.println("hello") {
		Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
		other => panic!("unexpected result: {other:?}"),
	}
	assert_eq!(a.sent(), b"hel");
	assert!(b.sent().is_empty());
}
