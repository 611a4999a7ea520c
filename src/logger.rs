//! Diagnostics of the `addrparse` binary, written to stderr by `env_logger`.

use std::io::Write;

use log::LevelFilter;

const CRATE_NAME: &str = env!("CARGO_CRATE_NAME");

/// Level for the number of `-v` flags.
pub fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Module of this crate that logged a record, e.g. `parser::list`.
fn stage(target: &str) -> &str {
    target
        .strip_prefix(CRATE_NAME)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

/// Show this crate's records up to the `-v` level as
/// `addrparse[debug parser::list]: ...`. `RUST_LOG` directives are applied
/// on top.
///
/// `run_addrparse` runs many times in one process under the integration
/// tests, so a second initialisation is ignored.
pub fn init_logger(verbosity: u8) {
    let _ = env_logger::Builder::new()
        .filter_module(CRATE_NAME, verbosity_level(verbosity))
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "addrparse[{} {}]: {}",
                record.level().as_str().to_ascii_lowercase(),
                stage(record.target()),
                record.args()
            )
        })
        .try_init();
}
