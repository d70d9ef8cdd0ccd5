//! A command-line frontend for the decoder.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use either::Either;

use radiosonde::message;
use radiosonde::output::json::JsonWriter;
use radiosonde::output::text::TextWriter;
use radiosonde::tables::TableSet;

/// A small observation message, for trying the decoder without a file.
const SAMPLE: &[u8] = include_bytes!("../fixtures/sample.bufr");

#[derive(Parser)]
#[command(version, about)]
struct Arguments {
    /// What to decode, and into which form.
    mode: Mode,
    /// Path to a JSON file of decoding tables.
    tables: PathBuf,
    /// Path to a message file (for the file modes).
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Decode the built-in sample message to text.
    Sample,
    /// Decode a file to text.
    Text,
    /// Decode a file to JSON.
    Json,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let arguments = Arguments::parse();
    let tables = TableSet::from_path(&arguments.tables)?;

    let data = match arguments.mode {
        Mode::Sample => SAMPLE.to_vec(),
        Mode::Text | Mode::Json => {
            let path = arguments.file.ok_or("No message file given.")?;
            println!("FILE {}", path.display());
            fs::read(path)?
        }
    };

    // Messages routinely arrive wrapped in GTS envelopes; the payload starts
    // at the first occurrence of the indicator.
    let payload = data
        .windows(4)
        .position(|window| window == b"BUFR")
        .map(|start| &data[start..])
        .ok_or("No message found in the input.")?;

    let mut sink = match arguments.mode {
        Mode::Sample | Mode::Text => Either::Left(TextWriter::new(&tables)),
        Mode::Json => Either::Right(JsonWriter::new()),
    };
    message::decode(payload, &tables, &mut sink)?;

    match sink {
        Either::Left(text) => println!("{}", text.into_lines().join("\n")),
        Either::Right(json) => println!("{}", json.to_json()?),
    }

    Ok(())
}
