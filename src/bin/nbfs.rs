//! nbfs CLI: XML <-> .NET Binary XML conversion.
//!
//! Ein- und Ausgabe sind standardmaessig Base64, auch Fehlermeldungen; der
//! Exit-Code ist dann immer 0. Mit `--raw` wird Klartext gelesen und
//! geschrieben, Fehler gehen nach stderr.

#[cfg(feature = "fast-alloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Args, Parser, Subcommand};
use nbfs::encoder::{EncoderConfig, encode_with_config};
use nbfs::options::CodecOptions;
use nbfs::xml_serializer::{XmlStyle, nodes_to_xml};
use nbfs::{decode_session_message, decode_with_options, parse_xml_nodes};
use std::io::{IsTerminal, Read, Write};
use std::process;

#[derive(Parser)]
#[command(
    name = "nbfs",
    about = "XML <-> .NET Binary XML (MC-NBFS) conversion",
    after_help = "NOTE: All output, including errors, is returned as a Base64 string unless --raw is given."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode XML to binary XML
    Encode(EncodeArgs),
    /// Decode binary XML to XML
    Decode(DecodeArgs),
}

#[derive(Args)]
struct EncodeArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct DecodeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Indented XML output (tab per level, one attribute per line)
    #[arg(long)]
    explode: bool,

    /// Maximum number of nodes
    #[arg(long)]
    max_nodes: Option<u64>,

    /// Maximum element depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum length of a single text/bytes payload
    #[arg(long)]
    max_payload: Option<usize>,
}

#[derive(Args)]
struct CommonArgs {
    /// Base64 payload
    #[arg(required_unless_present = "input")]
    data: Option<String>,

    /// Input file instead of the positional payload (- for stdin)
    #[arg(short, long, conflicts_with = "data")]
    input: Option<String>,

    /// Plain input and output instead of Base64
    #[arg(long)]
    raw: bool,

    /// Payload is a session message (string table block + body)
    #[arg(long)]
    session: bool,
}

impl DecodeArgs {
    fn to_options(&self) -> CodecOptions {
        let mut opts = CodecOptions::default();
        if let Some(max) = self.max_nodes {
            opts = opts.with_max_nodes(max);
        }
        if let Some(max) = self.max_depth {
            opts = opts.with_max_depth(max);
        }
        if let Some(max) = self.max_payload {
            opts = opts.with_max_payload_len(max);
        }
        opts
    }
}

/// Besitzer der Eingabedaten. Haelt entweder eine Mmap oder einen Vec<u8> am Leben.
enum InputData {
    Buf(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mmap(memmap2::Mmap),
}

impl std::ops::Deref for InputData {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            InputData::Buf(v) => v,
            #[cfg(feature = "mmap")]
            InputData::Mmap(m) => m,
        }
    }
}

fn read_stdin() -> Result<Vec<u8>, String> {
    if std::io::stdin().is_terminal() {
        eprintln!("Lese von stdin (Ctrl+D zum Beenden)...");
    }
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|e| format!("Lesefehler (stdin): {e}"))?;
    Ok(buf)
}

/// Laedt die Eingabe: Positionsargument, Datei (ggf. Memory-Mapped) oder stdin.
fn load_input(common: &CommonArgs) -> Result<InputData, String> {
    let Some(path) = common.input.as_deref() else {
        let data = common.data.as_deref().unwrap_or_default();
        return Ok(InputData::Buf(data.as_bytes().to_vec()));
    };
    if path == "-" {
        return read_stdin().map(InputData::Buf);
    }
    #[cfg(feature = "mmap")]
    {
        let file = std::fs::File::open(path).map_err(|e| format!("Lesefehler '{path}': {e}"))?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| format!("Mmap-Fehler '{path}': {e}"))?;
        return Ok(InputData::Mmap(mmap));
    }
    #[cfg(not(feature = "mmap"))]
    {
        let buf = std::fs::read(path).map_err(|e| format!("Lesefehler '{path}': {e}"))?;
        return Ok(InputData::Buf(buf));
    }
}

/// Payload-Bytes: Base64-decodiert, ausser bei `--raw`.
fn payload(common: &CommonArgs) -> Result<Vec<u8>, String> {
    let input = load_input(common)?;
    if common.raw {
        return Ok(input.to_vec());
    }
    let text: Vec<u8> = input.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    STANDARD.decode(text).map_err(|e| format!("invalid Base64 input: {e}"))
}

fn main() {
    let cli = Cli::parse();
    let raw = match &cli.command {
        Command::Encode(args) => args.common.raw,
        Command::Decode(args) => args.common.raw,
    };

    match run(cli) {
        Ok(out) => write_output(&out, raw),
        Err(e) if raw => {
            eprintln!("Fehler: {e}");
            process::exit(1);
        }
        Err(e) => write_output(e.as_bytes(), false),
    }
}

fn write_output(bytes: &[u8], raw: bool) {
    let mut stdout = std::io::stdout().lock();
    let result = if raw {
        stdout.write_all(bytes)
    } else {
        writeln!(stdout, "{}", STANDARD.encode(bytes))
    };
    if let Err(e) = result.and_then(|()| stdout.flush()) {
        eprintln!("Schreibfehler (stdout): {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<Vec<u8>, String> {
    match cli.command {
        Command::Encode(args) => run_encode(args),
        Command::Decode(args) => run_decode(args),
    }
}

fn run_encode(args: EncodeArgs) -> Result<Vec<u8>, String> {
    let bytes = payload(&args.common)?;
    let xml = String::from_utf8(bytes).map_err(|e| format!("XML input is not valid UTF-8: {e}"))?;
    if xml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let nodes = parse_xml_nodes(&xml).map_err(|e| e.to_string())?;
    let config = if args.common.session {
        EncoderConfig::session()
    } else {
        EncoderConfig::default()
    };
    encode_with_config(&nodes, config).map_err(|e| e.to_string())
}

fn run_decode(args: DecodeArgs) -> Result<Vec<u8>, String> {
    let opts = args.to_options();
    opts.validate().map_err(|e| format!("Ungueltige Optionen: {e}"))?;

    let bytes = payload(&args.common)?;
    let nodes = if args.common.session {
        decode_session_message(&bytes, &opts)
    } else {
        decode_with_options(&bytes, &opts)
    }
    .map_err(|e| e.to_string())?;

    let style = if args.explode { XmlStyle::Exploded } else { XmlStyle::Compact };
    let xml = nodes_to_xml(&nodes, style).map_err(|e| e.to_string())?;
    Ok(xml.into_bytes())
}
