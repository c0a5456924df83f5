//! ds3270 stream decoder
//!
//! Decodes one outbound 3270 record, applies it to a fresh screen and
//! prints the command, the resulting screen and its field table.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::debug;

use ds3270::config::{self, SessionConfig};
use ds3270::lib3270::{self, AddressingMode, Command, ScreenGeometry, TerminalState};

struct Options {
    rows: Option<u16>,
    cols: Option<u16>,
    fourteen_bit: bool,
    config: Option<PathBuf>,
    hex: Option<String>,
    input: Option<PathBuf>,
}

fn print_help() {
    println!("ds3270 - IBM 3270 data stream decoder");
    println!();
    println!("Usage: ds3270 [OPTIONS] [FILE]");
    println!();
    println!("Options:");
    println!("  --hex <bytes>        Decode a record given as hex (spaces allowed)");
    println!("  --rows <n>           Screen rows (default from configuration, 24)");
    println!("  --cols <n>           Screen columns (default from configuration, 80)");
    println!("  --14bit              Use 14-bit buffer addressing");
    println!("  --config <path>      Load session configuration from <path>");
    println!("  --help or -h         Show this help message");
    println!();
    println!("FILE holds one raw record. Set RUST_LOG=debug or trace for codec logging.");
    println!();
    println!("Example:");
    println!("  ds3270 --hex 'F5 C3 11 40 40 1D 60 C8 C9'");
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options {
        rows: None,
        cols: None,
        fourteen_bit: false,
        config: None,
        hex: None,
        input: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rows" => {
                options.rows = Some(value(args, i, "--rows")?.parse().context("--rows requires a number")?);
                i += 1;
            }
            "--cols" => {
                options.cols = Some(value(args, i, "--cols")?.parse().context("--cols requires a number")?);
                i += 1;
            }
            "--14bit" => options.fourteen_bit = true,
            "--config" => {
                options.config = Some(PathBuf::from(value(args, i, "--config")?));
                i += 1;
            }
            "--hex" => {
                options.hex = Some(value(args, i, "--hex")?.to_string());
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other if other.starts_with('-') => bail!("unknown option {}", other),
            path => options.input = Some(PathBuf::from(path)),
        }
        i += 1;
    }
    Ok(Some(options))
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .with_context(|| format!("invalid hex byte at {}", i))
        })
        .collect()
}

fn geometry(options: &Options) -> Result<ScreenGeometry> {
    let mut session = match &options.config {
        Some(path) => SessionConfig::load(path, "ds3270".to_string())?,
        None => config::load_default_config("ds3270".to_string()),
    };
    if let Some(rows) = options.rows {
        session.set_property(config::PROP_ROWS, rows as i64);
    }
    if let Some(cols) = options.cols {
        session.set_property(config::PROP_COLUMNS, cols as i64);
    }
    let geometry = session.geometry()?;
    if options.fourteen_bit {
        return Ok(ScreenGeometry::new(geometry.rows(), geometry.cols(), AddressingMode::FourteenBit)?);
    }
    Ok(geometry)
}

fn print_command(command: &Command) {
    match command.write_body() {
        Some((wcc, items)) => {
            println!("{:?} WCC=0x{:02X} ({} items)", command.code(), wcc.byte(), items.len());
        }
        None => println!("{:?}", command),
    }
}

fn print_fields(state: &TerminalState) {
    let fields = state.fields();
    if fields.is_empty() {
        println!("(unformatted screen)");
        return;
    }
    let geometry = state.geometry();
    println!("{:>6} {:>4} {:>4} {:>6} {:>5}  text", "addr", "row", "col", "length", "attr");
    for field in fields {
        println!(
            "{:>6} {:>4} {:>4} {:>6}  0x{:02X}  {:?}",
            field.start.value(),
            field.start.row(geometry),
            field.start.col(geometry),
            field.length,
            field.attribute.byte(),
            field.text().trim_end()
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args)? else {
        return Ok(());
    };

    let record = match (&options.hex, &options.input) {
        (Some(hex), _) => decode_hex(hex)?,
        (None, Some(path)) => {
            std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?
        }
        (None, None) => {
            print_help();
            bail!("no input record given");
        }
    };

    let geometry = geometry(&options)?;
    debug!("decoding {} bytes for a {}x{} screen", record.len(), geometry.rows(), geometry.cols());

    let command = lib3270::parse(&record, &geometry)?;
    print_command(&command);

    let mut state = TerminalState::new(geometry);
    state.apply_command(&command);
    println!(
        "cursor {} keyboard {}",
        state.cursor_address(),
        if state.is_keyboard_locked() { "locked" } else { "unlocked" }
    );
    println!("{}", state);
    print_fields(&state);
    Ok(())
}
