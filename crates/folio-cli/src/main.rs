use std::process::ExitCode;

use clap::Parser;
use folio_cli::{CliArgs, FolioCli};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match FolioCli::from_args("folio", &args).and_then(|cli| cli.run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
