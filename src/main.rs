//! Celpack - Command-line tool for packing sprite frames into texture atlases

use std::process::ExitCode;

use celpack::cli;

fn main() -> ExitCode {
    cli::run()
}
