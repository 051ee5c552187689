//! CLI tool to decode a vehicle status word.

use anyhow::{anyhow, Context};
use clap::Parser;
use mission_cli::init_tracing;
use mission_core::{decode_error_code, decode_status, StatusReport};

/// Decode a mission status word (decimal, or hex with 0x)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    word: String,

    /// Treat the word as the 16-bit error code of older vehicles
    #[arg(long)]
    legacy: bool,

    /// Print flags and report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_word(text: &str) -> anyhow::Result<u32> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid status word '{}'", text))
}

fn print_report(report: &StatusReport) {
    println!("[{}] {}", report.severity, report.message);
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let word = parse_word(&args.word)?;

    if args.legacy {
        let code = u16::try_from(word)
            .map_err(|_| anyhow!("legacy error codes are 16 bits, got {}", word))?;
        let flags = decode_error_code(code);
        let report = flags.report();
        if args.json {
            let value = serde_json::json!({ "flags": flags, "report": report });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{:#?}", flags);
            print_report(&report);
        }
        return Ok(());
    }

    let flags = decode_status(word);
    if word != flags.encode() {
        tracing::warn!("Ignoring unknown bits in status word {:#x}", word);
    }
    let report = flags.report();
    if args.json {
        let value = serde_json::json!({ "flags": flags, "report": report });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{:#?}", flags);
        print_report(&report);
    }
    Ok(())
}
