//! Rendering scan results: markdown issue bodies, stdout status reports,
//! and GitHub Actions step outputs.

mod json;
mod markdown;

pub use json::print_json;
pub use markdown::format_markdown;

use crate::error::Result;
use crate::model::ScanOutput;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Prints a scan result to stdout as a status report.
pub fn print_scan_output(output: &ScanOutput) -> Result<()> {
    match output {
        ScanOutput::Structured(report) => print_json(report),
        ScanOutput::Raw(text) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

/// Appends `name=value` lines to a GitHub Actions output file
/// (the path found in `GITHUB_OUTPUT`).
pub fn write_action_outputs(path: &Path, outputs: &[(&str, String)]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (name, value) in outputs {
        writeln!(file, "{}={}", name, value)?;
    }
    Ok(())
}
