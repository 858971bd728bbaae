//! ege-ingest - load exam-problem Markdown into a PocketBase task bank

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = ege_ingest::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
