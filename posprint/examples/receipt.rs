use posprint::{Font, Justification, NetBackend, Printer, DEFAULT_PORT};

fn main() {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("192.168.1.100:{DEFAULT_PORT}"));
    let backend = NetBackend::connect(&addr, None).expect("cannot connect to printer");
    let mut printer = Printer::new(backend);

    printer.initialize().expect("cannot initialize printer");
    printer.justify(Justification::Center).unwrap();
    printer.set_char_size(1, 1).unwrap();
    printer.println("RECEIPT").unwrap();
    printer.set_char_size(0, 0).unwrap();
    printer.justify(Justification::Left).unwrap();
    printer.set_tabs(24).unwrap();
    printer.set_font(Font::B).unwrap();
    printer.println("Coffee\t3.50").unwrap();
    printer.println("Bagel\t2.25").unwrap();
    printer.set_bold(true).unwrap();
    printer.print_fmt(format_args!("Total\t{:.2}\n", 5.75)).unwrap();
    printer.set_bold(false).unwrap();
    printer.feed_lines(4).expect("cannot feed paper");
    printer.cut().expect("cannot cut paper");
    printer.close().expect("cannot close printer");
}
