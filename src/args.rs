use clap::Parser;

/// What each input is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Address,
    List,
    Find,
    Headers,
}

#[derive(Parser, Debug)]
#[command(name = "addrparse")]
#[command(about = "Parse and normalize email addresses from messy text")]
#[command(
    long_about = "Parses email addresses and address lists leniently and prints them normalized, one per line. Inputs are taken from the arguments, or one per line from stdin."
)]
pub struct AddrparseArgs {
    /// Parse each input as a comma separated address list
    #[arg(short = 'l', long = "list", conflicts_with_all = ["find", "headers"])]
    pub list: bool,

    /// Print every address found in each input, as written
    #[arg(short = 'f', long = "find", conflicts_with_all = ["list", "headers"])]
    pub find: bool,

    /// Read a whole message from stdin and print the addresses of its From, To, Cc, ... headers
    #[arg(short = 'H', long = "headers", conflicts_with_all = ["list", "find", "inputs"])]
    pub headers: bool,

    /// Increase verbosity (can be used multiple times: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Inputs to parse (read from stdin, one per line, when omitted)
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,
}

impl AddrparseArgs {
    pub fn mode(&self) -> Mode {
        if self.headers {
            Mode::Headers
        } else if self.find {
            Mode::Find
        } else if self.list {
            Mode::List
        } else {
            Mode::Address
        }
    }
}
