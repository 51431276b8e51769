use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_num::maybe_hex;
use clap_verbosity::Verbosity;
use image::{
    imageops::{dither, ColorMap, FilterType},
    GrayImage, ImageFormat, ImageReader, Luma,
};
use posprint::{
    Backend, BitImageMode, Bitmap, Config, Density, FileBackend, Justification, MultiBackend,
    NetBackend, PixelGrid, Printer,
};
use std::{
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

mod selftest;

/// Used when neither `--addr` nor `--dev` is given.
const DEFAULT_ADDR: &str = "192.168.1.100:9100";

#[derive(Parser)]
#[command(about = "Print text, images and paper commands on ESC/POS receipt printers.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// IP address and port of a printer. May be repeated.
    #[arg(short, long = "addr", global = true)]
    addr: Vec<String>,

    /// Path to the device file of a printer. May be repeated.
    #[arg(short, long = "dev", global = true)]
    dev: Vec<PathBuf>,

    /// Justification to set before printing.
    #[arg(short, long, global = true)]
    justify: Option<Justify>,

    /// Printable width in dots.
    #[arg(long, global = true, default_value_t = Config::DEFAULT_MAX_WIDTH)]
    max_width: u32,

    /// Network timeout in seconds.
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Command {
    /// Print text from a file. STDIN is used if no file is given or the file is a single dash.
    Text {
        input: Option<PathBuf>,

        /// Width of the tabstop in spaces.
        #[arg(short, long, default_value_t = 4)]
        tab_width: i32,
    },

    /// Print the tabstop locations.
    Tabs {
        /// Width of the tabstop in spaces.
        #[arg(short, long, default_value_t = 4)]
        tab_width: i32,
    },

    /// Print an image.
    Image(ImageArgs),

    /// Cut the paper.
    Cut {
        /// Leave a point uncut.
        #[arg(short, long)]
        partial: bool,
    },

    /// Feed the paper.
    Feed {
        /// Amount to feed. With --lines this many lines, otherwise motion units as set by GS P.
        amount: i32,

        /// Use the line height as the unit of measurement.
        #[arg(short, long)]
        lines: bool,
    },

    /// Sound the buzzer.
    Beep {
        #[arg(default_value_t = 1)]
        times: i32,

        /// Duration of each beep, in 100ms.
        #[arg(default_value_t = 1)]
        duration: i32,
    },

    /// Query and print the error status.
    Status,

    /// Print one test block per printer feature.
    Selftest,
}

#[derive(clap::Args)]
struct ImageArgs {
    /// Image file to print. Supports PNG and JPEG.
    input: PathBuf,

    /// Raster density.
    #[arg(long, value_enum, default_value_t = RasterDensity::Normal)]
    density: RasterDensity,

    /// Print with column bit images in the given mode instead of raster images.
    #[arg(long, value_enum)]
    column: Option<ColumnMode>,

    /// Luma below this is printed black.
    #[arg(short = 'T', long, default_value_t = posprint::INK_THRESHOLD, value_parser = maybe_hex::<u8>)]
    threshold: u8,

    /// Invert the printed image.
    #[arg(short, long)]
    invert: bool,

    /// Scale the image to this width in dots.
    #[arg(short, long)]
    width: Option<u32>,

    /// Floyd-Steinberg dither instead of plain thresholding.
    #[arg(long)]
    dither: bool,

    /// Show the image instead of printing.
    #[arg(short, long)]
    show: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Justify {
    Left,
    Center,
    Right,
}

impl From<Justify> for Justification {
    fn from(j: Justify) -> Self {
        match j {
            Justify::Left => Justification::Left,
            Justify::Center => Justification::Center,
            Justify::Right => Justification::Right,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RasterDensity {
    Normal,
    DoubleWidth,
    DoubleHeight,
    Quadruple,
}

impl From<RasterDensity> for Density {
    fn from(d: RasterDensity) -> Self {
        match d {
            RasterDensity::Normal => Density::Normal,
            RasterDensity::DoubleWidth => Density::DoubleWidth,
            RasterDensity::DoubleHeight => Density::DoubleHeight,
            RasterDensity::Quadruple => Density::Quadruple,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ColumnMode {
    Single8,
    Double8,
    Single24,
    Double24,
}

impl From<ColumnMode> for BitImageMode {
    fn from(m: ColumnMode) -> Self {
        match m {
            ColumnMode::Single8 => BitImageMode::Single8,
            ColumnMode::Double8 => BitImageMode::Double8,
            ColumnMode::Single24 => BitImageMode::Single24,
            ColumnMode::Double24 => BitImageMode::Double24,
        }
    }
}

struct BlackWhiteMap(u8);

impl ColorMap for BlackWhiteMap {
    type Color = Luma<u8>;

    fn index_of(&self, color: &Self::Color) -> usize {
        if color.0[0] >= self.0 {
            1
        } else {
            0
        }
    }

    fn map_color(&self, color: &mut Self::Color) {
        let idx = self.index_of(color);
        if let Some(c) = self.lookup(idx) {
            *color = c;
        }
    }

    fn lookup(&self, index: usize) -> Option<Self::Color> {
        match index {
            0 => Some(Luma([0x00])),
            1 => Some(Luma([0xff])),
            _ => None,
        }
    }

    fn has_lookup(&self) -> bool {
        true
    }
}

fn open_backend(cli: &Cli) -> Result<Box<dyn Backend>> {
    let timeout = Some(Duration::from_secs(cli.timeout));
    let mut backends: Vec<Box<dyn Backend>> = Vec::new();

    for dev in &cli.dev {
        let backend = FileBackend::open(dev)
            .with_context(|| format!("unable to open device {}", dev.display()))?;
        backends.push(Box::new(backend));
    }

    let mut addrs: Vec<&str> = cli.addr.iter().map(String::as_str).collect();
    if addrs.is_empty() && backends.is_empty() {
        addrs.push(DEFAULT_ADDR);
    }
    for addr in addrs {
        let backend =
            NetBackend::connect(addr, timeout).with_context(|| format!("unable to dial {addr}"))?;
        backends.push(Box::new(backend));
    }

    if backends.len() == 1 {
        return Ok(backends.remove(0));
    }

    log::info!("printing to {} printers", backends.len());
    Ok(Box::new(MultiBackend::new(backends)?))
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        None => read_stdin(),
        Some(path) if path == Path::new("-") => read_stdin(),
        Some(path) => {
            std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
        }
    }
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data)?;
    Ok(data)
}

fn picture(args: &ImageArgs, max_width: u32) -> Result<GrayImage> {
    match args.input.extension().and_then(|e| e.to_str()) {
        Some("png" | "jpg" | "jpeg") => {}
        other => bail!("unsupported image format: {}", other.unwrap_or("none")),
    }

    log::trace!("decoding...");
    let img = ImageReader::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?
        .with_guessed_format()?
        .decode()?;

    let img = match args.width {
        Some(w) => {
            if w > max_width {
                bail!("requested width {w} exceeds the printable width of {max_width} dots");
            }
            log::trace!("resizing...");
            let h = (img.height() as f32 * w as f32 / img.width() as f32).ceil() as u32;
            img.resize_exact(w, h.max(1), FilterType::Gaussian)
        }
        None => img,
    };

    // flatten transparency onto white paper before thresholding
    let rgba = img.into_rgba8();
    let mut gray = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Luma([posprint::over_white(posprint::luma(r, g, b), a)])
    });

    if args.dither {
        log::trace!("dithering...");
        dither(&mut gray, &BlackWhiteMap(args.threshold));
    }
    Ok(gray)
}

fn bitmap(args: &ImageArgs, max_width: u32) -> Result<Bitmap> {
    let gray = picture(args, max_width)?;
    let threshold = args.threshold;
    Ok(Bitmap::from_fn(gray.width(), gray.height(), |x, y| {
        (gray.get_pixel(x, y).0[0] < threshold) ^ args.invert
    }))
}

fn preview(args: &ImageArgs, max_width: u32) -> Result<()> {
    let bitmap = bitmap(args, max_width)?;
    let preview = GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        Luma([if bitmap.is_ink(x, y) { 0x00 } else { 0xff }])
    });
    let temppath = std::env::temp_dir().join("posprint-preview.png");
    preview.save_with_format(&temppath, ImageFormat::Png)?;
    open::that(&temppath)?;
    Ok(())
}

fn image(printer: &mut Printer, args: &ImageArgs, max_width: u32) -> Result<()> {
    let bitmap = bitmap(args, max_width)?;
    match args.column {
        Some(mode) => printer.print_bit_image(&bitmap, mode.into())?,
        None => printer.print_image(&bitmap, args.density.into())?,
    }
    Ok(())
}

fn tabs(printer: &mut Printer, tab_width: i32) -> Result<()> {
    use itertools::Itertools;

    printer.set_tabs(tab_width).context("SetTabs()")?;
    printer
        .println(&(0..=32).join("\t"))
        .context("Println()")?;
    let status = printer
        .transmit_error_status()
        .context("TransmitErrorStatus()")?;
    log::info!("error status: {status}");
    Ok(())
}

fn run(cli: &Cli, printer: &mut Printer) -> Result<()> {
    if let Some(j) = cli.justify {
        printer.justify(j.into())?;
    }

    match &cli.command {
        Command::Text { input, tab_width } => {
            let raw = read_input(input.as_deref())?;
            let text = String::from_utf8_lossy(&raw);
            printer.set_tabs(*tab_width)?;
            printer.print(&text)?;
        }
        Command::Tabs { tab_width } => tabs(printer, *tab_width)?,
        Command::Image(args) => image(printer, args, cli.max_width)?,
        Command::Cut { partial: false } => printer.cut()?,
        Command::Cut { partial: true } => printer.partial_cut()?,
        Command::Feed { amount, lines: true } => printer.feed_lines(*amount)?,
        Command::Feed { amount, lines: false } => printer.feed(*amount)?,
        Command::Beep { times, duration } => printer.beep(*times, *duration)?,
        Command::Status => {
            let status = printer.transmit_error_status()?;
            println!("{status}");
        }
        Command::Selftest => selftest::run(printer)?,
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::builder()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    if let Command::Image(args) = &cli.command {
        if args.show {
            return preview(args, cli.max_width);
        }
    }

    let config = Config::default().with_max_width(cli.max_width);
    let backend = open_backend(&cli)?;
    let mut printer = Printer::with_config(backend, config)?;

    let result = run(&cli, &mut printer);
    let closed = printer.close().context("cannot close printer");
    result.and(closed)
}
