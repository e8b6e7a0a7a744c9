//! tiledb - command-line front-end to the TileDB array storage engine

use std::process::ExitCode;

fn main() -> ExitCode {
    match tiledb_cli::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(tiledb_cli::cli::exit_code(&e))
        }
    }
}
