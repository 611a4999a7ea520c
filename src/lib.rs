//! Lenient parsing of email addresses and address lists.
//!
//! Real-world headers and free text rarely follow RFC 5322. This crate
//! recovers `(name, address)` pairs from them anyway and normalizes the
//! address part to lower-case `local@domain`:
//!
//! ```
//! use lenient_address::{parse_address, parse_address_list};
//!
//! let parsed = parse_address("Erik Unger <Erik.Unger@Domonda.com>").unwrap();
//! assert_eq!(parsed.name(), "Erik Unger");
//! assert_eq!(parsed.address(), "erik.unger@domonda.com");
//!
//! assert!(parse_address_list("undisclosed-recipients:;").unwrap().is_empty());
//! ```

use std::io::{Read, Write};

pub mod args;
pub mod logger;
pub mod parser;

use anyhow::Context;
use args::Mode;
use clap::Parser;
use log::{error, info};

pub use parser::{
    find_all_addresses, parse_address, parse_address_list, ParseError, ParsedAddress,
};

/// Entry point of the `addrparse` binary.
///
/// Returns the process exit code: 0 when every input parsed, 1 otherwise.
pub fn run_addrparse(
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    args: &[String],
) -> i32 {
    let args_str: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let cli_args = match args::AddrparseArgs::try_parse_from(args_str) {
        Ok(args) => args,
        Err(e) => {
            let out: &mut dyn Write = if e.use_stderr() { stderr } else { stdout };
            let _ = write!(out, "{}", e.render());
            return e.exit_code();
        }
    };

    logger::init_logger(cli_args.verbosity);

    match process(&cli_args, stdin, stdout, stderr) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("{:#}", e);
            let _ = writeln!(stderr, "addrparse: {:#}", e);
            1
        }
    }
}

/// Parse all inputs; returns whether every one of them succeeded.
fn process(
    cli_args: &args::AddrparseArgs,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> anyhow::Result<bool> {
    let mode = cli_args.mode();
    let parse: fn(&str) -> Result<Vec<String>, ParseError> = match mode {
        Mode::Headers => return process_headers(stdin, stdout, stderr),
        Mode::Address => |input| parse_address(input).map(|a| vec![a.to_string()]),
        Mode::List => |input| {
            parse_address_list(input).map(|list| list.iter().map(ToString::to_string).collect())
        },
        Mode::Find => |input| Ok(find_all_addresses(input)),
    };

    let inputs = if cli_args.inputs.is_empty() {
        let mut text = String::new();
        stdin
            .read_to_string(&mut text)
            .context("Failed to read inputs from stdin")?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    } else {
        cli_args.inputs.clone()
    };
    info!("Parsing {} input(s) as {:?}", inputs.len(), mode);

    let mut all_ok = true;
    for input in &inputs {
        match parse(input) {
            Ok(lines) => {
                for line in lines {
                    writeln!(stdout, "{}", line).context("Failed to write output")?;
                }
            }
            Err(e) => {
                error!("Failed to parse {:?}: {}", input, e);
                writeln!(stderr, "addrparse: {}", e).context("Failed to write error")?;
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

/// Print `Header: address` for every address header of the message on stdin.
fn process_headers(
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> anyhow::Result<bool> {
    let mut message = String::new();
    stdin
        .read_to_string(&mut message)
        .context("Failed to read message from stdin")?;

    match parser::parse_address_headers(&message) {
        Ok(headers) => {
            info!("Found {} address header(s)", headers.len());
            for header in headers {
                for address in &header.addresses {
                    writeln!(stdout, "{}: {}", header.name, address)
                        .context("Failed to write output")?;
                }
            }
            Ok(true)
        }
        Err(e) => {
            error!("Failed to parse address header: {}", e);
            writeln!(stderr, "addrparse: {}", e).context("Failed to write error")?;
            Ok(false)
        }
    }
}
