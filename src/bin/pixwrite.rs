//! pixwrite CLI - convert images with the pixwrite writers.
//!
//! Reads PNG, JPEG, PPM or PGM input and writes PNG, JPEG, BMP, TGA or
//! Radiance HDR.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};

use pixwrite::{bmp, hdr, jpeg, tga, ColorType, EncodeConfig, FilterType, PixelView};

/// Convert an image to PNG, JPEG, BMP, TGA or Radiance HDR.
#[derive(Parser, Debug)]
#[command(name = "pixwrite")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image file (PNG, JPEG, PPM, or PGM)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (format detected from extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output format (overrides extension detection)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality (1-100, 0 = default of 90)
    #[arg(short, long, default_value = "0")]
    quality: u8,

    /// PNG zlib quality (hash chain length; values below 5 act as 5)
    #[arg(short = 'c', long, default_value_t = pixwrite::config::DEFAULT_PNG_COMPRESSION_QUALITY)]
    png_quality: u32,

    /// PNG row filter
    #[arg(long, value_enum, default_value = "auto")]
    filter: FilterArg,

    /// Write uncompressed TGA
    #[arg(long)]
    no_rle: bool,

    /// Store rows bottom to top
    #[arg(long)]
    flip: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// PNG format (lossless)
    Png,
    /// Baseline JPEG (lossy)
    Jpeg,
    /// JPEG format (alias for jpeg)
    Jpg,
    /// 24-bit BMP
    Bmp,
    /// Truevision TGA
    Tga,
    /// Radiance RGBE
    Hdr,
}

impl OutputFormat {
    fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "bmp" => Some(OutputFormat::Bmp),
            "tga" => Some(OutputFormat::Tga),
            "hdr" => Some(OutputFormat::Hdr),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg | OutputFormat::Jpg => "jpg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tga => "tga",
            OutputFormat::Hdr => "hdr",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    /// Pick the best filter for each row
    Auto,
    /// No filter
    None,
    /// Sub filter
    Sub,
    /// Up filter
    Up,
    /// Average filter
    Average,
    /// Paeth filter
    Paeth,
}

impl From<FilterArg> for Option<FilterType> {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Auto => None,
            FilterArg::None => Some(FilterType::None),
            FilterArg::Sub => Some(FilterType::Sub),
            FilterArg::Up => Some(FilterType::Up),
            FilterArg::Average => Some(FilterType::Average),
            FilterArg::Paeth => Some(FilterType::Paeth),
        }
    }
}

/// Decoded image data.
struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    color_type: ColorType,
    input_format: &'static str,
}

/// Detect input format from file header bytes.
fn detect_format(path: &Path) -> Result<&'static str, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 8];
    file.read_exact(&mut header)?;

    if header.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok("png");
    }
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok("jpeg");
    }
    if header.starts_with(b"P6") || header.starts_with(b"P5") {
        return Ok("pnm");
    }

    Err("Unknown image format. Supported: PNG, JPEG, PPM (P6), PGM (P5)".into())
}

/// Decode a PNG file to 8-bit samples.
fn decode_png(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(file);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut pixels = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels)?;
    pixels.truncate(info.buffer_size());

    let color_type = match info.color_type {
        png::ColorType::Grayscale => ColorType::Gray,
        png::ColorType::GrayscaleAlpha => ColorType::GrayAlpha,
        png::ColorType::Rgb => ColorType::Rgb,
        png::ColorType::Rgba => ColorType::Rgba,
        png::ColorType::Indexed => return Err("Indexed PNG could not be expanded".into()),
    };

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        pixels,
        color_type,
        input_format: "PNG",
    })
}

/// Decode a JPEG file.
fn decode_jpeg(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let pixels = decoder.decode()?;
    let info = decoder.info().ok_or("Failed to get JPEG info")?;

    let color_type = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => ColorType::Gray,
        jpeg_decoder::PixelFormat::L16 => return Err("16-bit grayscale JPEG not supported.".into()),
        jpeg_decoder::PixelFormat::RGB24 => ColorType::Rgb,
        jpeg_decoder::PixelFormat::CMYK32 => {
            return Err("CMYK JPEG not supported. Convert to RGB first.".into())
        }
    };

    Ok(DecodedImage {
        width: info.width as u32,
        height: info.height as u32,
        pixels,
        color_type,
        input_format: "JPEG",
    })
}

/// Decode a binary PPM (P6) or PGM (P5) file.
fn decode_pnm(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut token = String::new();
    read_token(&mut reader, &mut token)?;
    let (color_type, input_format) = match token.as_str() {
        "P5" => (ColorType::Gray, "PGM"),
        "P6" => (ColorType::Rgb, "PPM"),
        other => {
            return Err(format!("Unsupported format '{other}'. Expected P5 (PGM) or P6 (PPM)").into())
        }
    };

    read_token(&mut reader, &mut token)?;
    let width: u32 = token.parse()?;
    read_token(&mut reader, &mut token)?;
    let height: u32 = token.parse()?;
    read_token(&mut reader, &mut token)?;
    let max_val: u32 = token.parse()?;
    if max_val != 255 {
        return Err(format!("Unsupported max value {max_val}. Only 8-bit (255) supported").into());
    }

    let expected_size = width as usize * height as usize * color_type.bytes_per_pixel();
    let mut pixels = vec![0u8; expected_size];
    reader.read_exact(&mut pixels)?;

    Ok(DecodedImage {
        width,
        height,
        pixels,
        color_type,
        input_format,
    })
}

/// Read the next whitespace-delimited token, skipping comments.
fn read_token<R: BufRead>(reader: &mut R, token: &mut String) -> std::io::Result<()> {
    token.clear();
    let mut in_comment = false;

    loop {
        let mut byte = [0u8; 1];
        if reader.read(&mut byte)? == 0 {
            break;
        }
        let ch = byte[0] as char;

        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if ch == '#' {
            in_comment = true;
            continue;
        }
        if ch.is_ascii_whitespace() {
            if !token.is_empty() {
                break;
            }
            continue;
        }
        token.push(ch);
    }

    Ok(())
}

/// Load and decode an image file.
fn load_image(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    match detect_format(path)? {
        "png" => decode_png(path),
        "jpeg" => decode_jpeg(path),
        _ => decode_pnm(path),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let start = Instant::now();
    let img = load_image(&args.input)?;
    let load_time = start.elapsed();

    if args.verbose {
        eprintln!("Loaded: {:?}", args.input);
        eprintln!("  Input format: {}", img.input_format);
        eprintln!("  Dimensions: {}x{}", img.width, img.height);
        eprintln!("  Color type: {:?}", img.color_type);
        eprintln!("  Load time: {:.2?}", load_time);
    }

    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(OutputFormat::from_extension))
        .unwrap_or(OutputFormat::Png);
    let output_path = args.output.clone().unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension(format!("out.{}", format.extension()));
        path
    });

    let config = EncodeConfig::default()
        .with_flip_vertically(args.flip)
        .with_png_compression_quality(args.png_quality)
        .with_png_filter(args.filter)
        .with_tga_rle(!args.no_rle);
    let channels = img.color_type.channels() as u8;

    let encode_start = Instant::now();
    let view = PixelView::new(&img.pixels, img.width, img.height, channels)?;
    match format {
        OutputFormat::Png => pixwrite::png::write_to_file(&output_path, &view, &config)?,
        OutputFormat::Jpeg | OutputFormat::Jpg => {
            jpeg::write_to_file(&output_path, &view, args.quality, &config)?
        }
        OutputFormat::Bmp => bmp::write_to_file(&output_path, &view, &config)?,
        OutputFormat::Tga => tga::write_to_file(&output_path, &view, &config)?,
        OutputFormat::Hdr => {
            let linear: Vec<f32> = img.pixels.iter().map(|&v| v as f32 / 255.0).collect();
            let view = PixelView::new(&linear, img.width, img.height, channels)?;
            hdr::write_to_file(&output_path, &view, &config)?;
        }
    }
    let encode_time = encode_start.elapsed();

    let input_size = fs::metadata(&args.input)?.len();
    let output_size = fs::metadata(&output_path)?.len();
    let ratio = if input_size > 0 {
        (output_size as f64 / input_size as f64) * 100.0
    } else {
        0.0
    };

    if args.verbose {
        eprintln!("Output: {:?}", output_path);
        eprintln!("  Format: {:?}", format);
        match format {
            OutputFormat::Png => {
                eprintln!("  zlib quality: {}", args.png_quality);
                eprintln!("  Filter: {:?}", args.filter);
            }
            OutputFormat::Jpeg | OutputFormat::Jpg => {
                eprintln!("  Quality: {}", args.quality);
            }
            OutputFormat::Tga => eprintln!("  RLE: {}", !args.no_rle),
            OutputFormat::Bmp | OutputFormat::Hdr => {}
        }
        eprintln!("  Flip: {}", args.flip);
        eprintln!("  Encode time: {:.2?}", encode_time);
        eprintln!(
            "  Size: {} -> {} ({:.1}%)",
            format_size(input_size),
            format_size(output_size),
            ratio
        );
    } else {
        println!(
            "{} -> {} ({:.1}%)",
            format_size(input_size),
            format_size(output_size),
            ratio
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
