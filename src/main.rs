use lenient_address::run_addrparse;
use std::env;
use std::io::{stderr, stdin, stdout};

fn main() {
    let args: Vec<String> = env::args().collect();

    let exit_code = run_addrparse(&mut stdin(), &mut stdout(), &mut stderr(), &args);

    std::process::exit(exit_code);
}
