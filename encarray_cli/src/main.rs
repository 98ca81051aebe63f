use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{debug, info};

use encarray_codecs::{
    bundled_codecs, codec_by_id, AnyCodec, DeflateArrayCodec, Lz4ArrayCodec, PlainArrayCodec,
    ZstdArrayCodec,
};
use encarray_core::{
    write_array, ArrayCodec, Element, ElementType, RawArray, Reader, Shape, VarlenDiffArrayCodec,
    Writer,
};

/// Elements handed to the streaming writer per call.
const WRITE_CHUNK: usize = 4096;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "encarray",
    about = "Encoded integer arrays: encode, inspect, and randomly access .earr files",
    version
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode whitespace- or comma-separated integers into a container file
    Encode {
        /// Text file of integers ("-" reads stdin)
        input: PathBuf,
        /// Destination container file
        output: PathBuf,
        /// Codec to use: plain | varlen-diff | zstd | lz4 | deflate
        #[arg(short, long, default_value = "varlen-diff", env = "ENCARRAY_CODEC")]
        codec: String,
        /// Element type: i8 i16 i32 i64 i128 u8 u16 u32 u64 u128
        #[arg(short, long, default_value = "i64")]
        dtype: ElementType,
        /// Zstd compression level (1–22, only used with --codec zstd)
        #[arg(long, default_value_t = 3, env = "ENCARRAY_ZSTD_LEVEL")]
        zstd_level: i32,
        /// Column-major dimensions such as 4x3; defaults to a flat vector
        #[arg(short, long)]
        shape: Option<String>,
    },
    /// Decode a container file back to integers, one per line
    Decode {
        /// Source container file
        input: PathBuf,
        /// Destination file ("-" or omitted writes to stdout)
        output: Option<PathBuf>,
    },
    /// Print header metadata and size statistics
    Inspect {
        /// Container file to inspect
        file: PathBuf,
    },
    /// Decode a single element by linear index
    Get {
        /// Container file
        file: PathBuf,
        /// Zero-based linear (column-major) index
        #[arg(short, long)]
        index: usize,
    },
    /// Encode the same input with every bundled codec and compare sizes
    Compare {
        /// Text file of integers ("-" reads stdin)
        input: PathBuf,
        /// Element type: i8 i16 i32 i64 i128 u8 u16 u32 u64 u128
        #[arg(short, long, default_value = "i64")]
        dtype: ElementType,
    },
}

/// Runs `$f::<T>(args)` with `T` the Rust type behind an [`ElementType`].
macro_rules! with_element {
    ($ty:expr, $f:ident ( $($arg:expr),* $(,)? )) => {
        match $ty {
            ElementType::I8 => $f::<i8>($($arg),*),
            ElementType::I16 => $f::<i16>($($arg),*),
            ElementType::I32 => $f::<i32>($($arg),*),
            ElementType::I64 => $f::<i64>($($arg),*),
            ElementType::I128 => $f::<i128>($($arg),*),
            ElementType::U8 => $f::<u8>($($arg),*),
            ElementType::U16 => $f::<u16>($($arg),*),
            ElementType::U32 => $f::<u32>($($arg),*),
            ElementType::U64 => $f::<u64>($($arg),*),
            ElementType::U128 => $f::<u128>($($arg),*),
        }
    };
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn codec_from_name(name: &str, zstd_level: i32) -> anyhow::Result<AnyCodec> {
    match name {
        "plain" | "none" => Ok(AnyCodec::Plain(PlainArrayCodec)),
        "varlen-diff" | "diff" | "varlen" => Ok(AnyCodec::VarlenDiff(VarlenDiffArrayCodec)),
        "zstd" | "z" => Ok(AnyCodec::Zstd(ZstdArrayCodec::new(zstd_level))),
        "lz4" | "l" => Ok(AnyCodec::Lz4(Lz4ArrayCodec)),
        "deflate" | "d" => Ok(AnyCodec::Deflate(DeflateArrayCodec::default())),
        other => bail!(
            "unknown codec '{}'. Valid options: plain, varlen-diff, zstd, lz4, deflate",
            other
        ),
    }
}

fn parse_shape(text: &str) -> anyhow::Result<Shape> {
    let dims = text
        .split(['x', 'X', ','])
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid dimension '{}' in shape '{}'", d, text))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Shape::new(dims)?)
}

fn is_std_stream(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn read_text(input: &Path) -> anyhow::Result<String> {
    let mut text = String::new();
    if is_std_stream(input) {
        io::stdin().lock().read_to_string(&mut text)?;
    } else {
        File::open(input)
            .with_context(|| format!("opening input file {:?}", input))?
            .read_to_string(&mut text)?;
    }
    Ok(text)
}

fn parse_values<T>(text: &str) -> anyhow::Result<Vec<T>>
where
    T: Element + FromStr,
    T::Err: Display,
{
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
        .enumerate()
        .map(|(i, tok)| {
            tok.parse::<T>().map_err(|e| {
                anyhow::anyhow!("value #{} '{}' is not a valid {}: {}", i, tok, T::ELEMENT_TYPE, e)
            })
        })
        .collect()
}

fn open_container(path: &Path) -> anyhow::Result<(Reader, AnyCodec)> {
    let reader = Reader::open(path).with_context(|| format!("opening container {:?}", path))?;
    let codec = codec_by_id(reader.codec_id())?;
    Ok((reader, codec))
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let var = if std::env::var_os("ENCARRAY_LOG").is_some() {
        "ENCARRAY_LOG"
    } else {
        "RUST_LOG"
    };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(var, default)).init();
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_encode<T>(
    text: &str,
    output: &Path,
    codec: AnyCodec,
    shape: Option<Shape>,
) -> anyhow::Result<()>
where
    T: Element + FromStr,
    T::Err: Display,
{
    let values = parse_values::<T>(text)?;
    let raw_size = (values.len() * T::ELEMENT_TYPE.size()) as u64;
    let t0 = Instant::now();

    let shape = match shape {
        Some(shape) => {
            let array = RawArray::new(shape, values)?;
            let encoded = codec.encode_array(&array)?;
            write_array(output, &encoded)
                .with_context(|| format!("writing output file {:?}", output))?;
            encoded.shape().clone()
        }
        None => {
            let mut writer = Writer::<T, _>::create(output, codec)
                .with_context(|| format!("creating output file {:?}", output))?;
            for chunk in values.chunks(WRITE_CHUNK) {
                writer.write(chunk)?;
            }
            Shape::vector(writer.finish()?)
        }
    };
    let elapsed = t0.elapsed();

    let file_size = std::fs::metadata(output)?.len();
    eprintln!("  codec       : {}", codec.name());
    eprintln!("  dtype       : {}", T::ELEMENT_TYPE);
    eprintln!("  shape       : {}", shape);
    eprintln!("  raw size    : {}", human_bytes(raw_size));
    eprintln!("  file size   : {}", human_bytes(file_size));
    eprintln!("  ratio       : {:.2}x", raw_size as f64 / file_size.max(1) as f64);
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decode<T: Element>(reader: Reader, codec: AnyCodec, output: Option<PathBuf>) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let encoded = reader.read_array::<T, _>(codec)?;
    let values = encoded.to_vec()?;
    let elapsed = t0.elapsed();

    let mut dst: Box<dyn Write> = match &output {
        Some(path) if !is_std_stream(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating output file {:?}", path))?,
        )),
        _ => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for v in &values {
        writeln!(dst, "{}", v)?;
    }
    dst.flush()?;

    eprintln!("  shape       : {}", encoded.shape());
    eprintln!("  elements    : {}", values.len());
    eprintln!("  decoded in  : {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

fn run_inspect(file: PathBuf) -> anyhow::Result<()> {
    let (reader, codec) = open_container(&file)?;
    let file_size = std::fs::metadata(&file)?.len();
    let header = &reader.header;

    println!("=== Encoded array: {:?} ===", file);
    println!();
    println!("  format version : {}", header.version);
    println!("  codec          : {} (id={})", codec.name(), header.codec_id);
    println!("  element type   : {}", header.element);
    println!("  shape          : {} ({} dims)", header.shape, header.shape.ndims());
    println!("  elements       : {}", header.shape.len());
    println!("  raw size       : {}", human_bytes(reader.raw_size()));
    println!("  payload        : {}", human_bytes(reader.payload_len()));
    println!("  file on disk   : {}", human_bytes(file_size));
    println!("  ratio          : {:.2}x", reader.ratio());
    println!("  flags          : 0x{:04x}", header.flags);
    println!("  checksum       : {:016x}", header.checksum);
    Ok(())
}

fn run_get<T: Element>(reader: Reader, codec: AnyCodec, index: usize) -> anyhow::Result<()> {
    let encoded = reader.read_array::<T, _>(codec)?;
    debug!("get: {} elements, index {}", encoded.len(), index);

    let t0 = Instant::now();
    let value = encoded.get(index)?;
    let elapsed = t0.elapsed();

    eprintln!(
        "  element {} of {} decoded in {:.3}ms",
        index,
        encoded.len(),
        elapsed.as_secs_f64() * 1000.0
    );
    println!("{}", value);
    Ok(())
}

fn run_compare<T>(text: &str) -> anyhow::Result<()>
where
    T: Element + FromStr,
    T::Err: Display,
{
    let values = parse_values::<T>(text)?;
    let raw_size = (values.len() * T::ELEMENT_TYPE.size()) as u64;
    info!("compare: {} {} values", values.len(), T::ELEMENT_TYPE);

    println!("=== {} x {} ({}) ===", values.len(), T::ELEMENT_TYPE, human_bytes(raw_size));
    println!();
    println!(
        "  {:<12}  {:>12}  {:>8}  {:>10}  {:>10}",
        "codec", "encoded", "ratio", "encode ms", "decode ms"
    );
    println!("  {}", "-".repeat(60));
    for codec in bundled_codecs() {
        let t0 = Instant::now();
        let encoded = codec.encode(&values)?;
        let encode_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        let decoded = encoded.to_vec()?;
        let decode_ms = t1.elapsed().as_secs_f64() * 1000.0;
        if decoded != values {
            bail!("codec {} did not round-trip the input", codec.name());
        }

        println!(
            "  {:<12}  {:>12}  {:>7.2}x  {:>10.3}  {:>10.3}",
            codec.name(),
            human_bytes(encoded.encoded_size() as u64),
            encoded.ratio(),
            encode_ms,
            decode_ms
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            codec,
            dtype,
            zstd_level,
            shape,
        } => {
            let codec = codec_from_name(&codec, zstd_level)?;
            let shape = shape.as_deref().map(parse_shape).transpose()?;
            let text = read_text(&input)?;
            with_element!(dtype, run_encode(&text, &output, codec, shape))
        }
        Commands::Decode { input, output } => {
            let (reader, codec) = open_container(&input)?;
            with_element!(reader.element_type(), run_decode(reader, codec, output))
        }
        Commands::Inspect { file } => run_inspect(file),
        Commands::Get { file, index } => {
            let (reader, codec) = open_container(&file)?;
            with_element!(reader.element_type(), run_get(reader, codec, index))
        }
        Commands::Compare { input, dtype } => {
            let text = read_text(&input)?;
            with_element!(dtype, run_compare(&text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values_mixed_separators() {
        let v = parse_values::<i16>("1, -2\n3\t4,,5").unwrap();
        assert_eq!(v, vec![1, -2, 3, 4, 5]);
        assert!(parse_values::<u8>("1 300").is_err());
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("4x3").unwrap().dims(), &[4, 3]);
        assert!(parse_shape("4xq").is_err());
    }

    #[test]
    fn test_codec_from_name() {
        assert_eq!(codec_from_name("diff", 3).unwrap().name(), "varlen-diff");
        assert!(matches!(
            codec_from_name("zstd", 9).unwrap(),
            AnyCodec::Zstd(ZstdArrayCodec { level: 9 })
        ));
        assert!(codec_from_name("brotli", 3).is_err());
    }
}
