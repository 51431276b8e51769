//! Prints one labelled block per printer feature, to be checked by eye.

use anyhow::{Context, Result};
use posprint::{Font, Justification, Printer};

type Test = fn(&mut Printer) -> Result<()>;

const TESTS: &[(&str, Test)] = &[
    ("beep", beep),
    ("horizontal tab", ht),
    ("line spacing", line_spacing),
    ("bold", bold),
    ("rotate 90", rotate90),
    ("reverse printing", reverse_printing),
    ("fonts", fonts),
    ("justify", justify),
    ("character size", char_size),
];

/// Run every test, then print a footer and feed the paper out.
/// A failing test does not stop the others.
pub fn run(printer: &mut Printer) -> Result<()> {
    let mut failed = Vec::new();

    for (i, (name, test)) in TESTS.iter().enumerate() {
        log::info!("running test [{}/{}] {name}", i + 1, TESTS.len());
        if let Err(e) = run_one(printer, name, *test) {
            log::error!("{e:#}");
            failed.push(e);
        }
    }

    let now = chrono::Local::now().format("%Y-%m-%d %-I:%M%p");
    printer.println(&format!("##### {now} #####"))?;
    printer.feed_lines(10)?;

    if !failed.is_empty() {
        anyhow::bail!("{} of {} tests failed", failed.len(), TESTS.len());
    }
    Ok(())
}

fn run_one(printer: &mut Printer, name: &str, test: Test) -> Result<()> {
    printer.initialize()?;
    printer.println(&format!("=== {name} ==="))?;
    let result = test(printer).with_context(|| format!("failed test {name}"));
    printer.lf()?;
    result
}

fn beep(printer: &mut Printer) -> Result<()> {
    printer.beep(1, 1)?;
    Ok(())
}

fn ht(printer: &mut Printer) -> Result<()> {
    printer
        .print("-")
        .context("could not print HT prefix")?;
    printer
        .set_ht(&[10])
        .context("could not set HT positions")?;
    printer.ht()?;
    printer
        .println("- 10 character tab")
        .context("could not print HT suffix")?;
    printer
        .println(&format!("~{}~", "-".repeat(9)))
        .context("could not print ruler line")?;
    printer.set_ht(&[])?;
    Ok(())
}

fn line_spacing(printer: &mut Printer) -> Result<()> {
    for spacing in [0, 255] {
        printer
            .set_line_spacing(spacing)
            .with_context(|| format!("could not set line spacing to {spacing}"))?;
        printer.print_fmt(format_args!("Spacing {spacing} start\n"))?;
        printer.print_fmt(format_args!("Spacing {spacing} end\n"))?;
    }

    printer.reset_line_spacing()?;
    printer.println("Reset spacing start")?;
    printer.println("Reset spacing end")?;
    Ok(())
}

fn bold(printer: &mut Printer) -> Result<()> {
    printer.print("Normal ")?;
    printer.set_bold(true)?;
    printer.print("Bold")?;
    printer.set_bold(false)?;
    printer.println(" Normal")?;
    Ok(())
}

fn rotate90(printer: &mut Printer) -> Result<()> {
    printer.println("Control Text")?;
    printer.set_rotate90(true)?;
    printer.println("Rotated Text")?;
    printer.set_rotate90(false)?;
    Ok(())
}

fn reverse_printing(printer: &mut Printer) -> Result<()> {
    printer.println("Control Text")?;
    printer.set_reverse_printing(true)?;
    printer.println("Reversed Text")?;
    printer.set_reverse_printing(false)?;
    Ok(())
}

fn fonts(printer: &mut Printer) -> Result<()> {
    for (font, label) in [(Font::A, "Font A"), (Font::B, "Font B")] {
        printer.set_font(font)?;
        printer
            .println(label)
            .with_context(|| format!("could not print {label}"))?;
    }
    printer.set_font(Font::A)?;
    Ok(())
}

fn justify(printer: &mut Printer) -> Result<()> {
    for (j, label) in [
        (Justification::Left, "Left Justify"),
        (Justification::Center, "Center Justify"),
        (Justification::Right, "Right Justify"),
    ] {
        printer.justify(j)?;
        printer
            .println(label)
            .with_context(|| format!("could not print {label}"))?;
    }
    printer.justify(Justification::Left)?;
    Ok(())
}

fn char_size(printer: &mut Printer) -> Result<()> {
    for n in [0, 1, 3] {
        printer.set_char_size(n, n)?;
        printer.print_fmt(format_args!("x{}\n", n + 1))?;
    }
    printer.set_char_size(0, 0)?;
    Ok(())
}
