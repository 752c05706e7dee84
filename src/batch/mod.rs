//! Per-file batch processing over a workspace folder
//!
//! Files are handled one at a time in sorted order. A failure is recorded
//! against the file that caused it and the batch moves on.

pub mod input;
pub mod report;

pub use input::{list_inputs, InputFile};
pub use report::{BatchReport, FileOutcome, Outcome};

use crate::error::ToolError;

/// Run `op` over every input, collecting one outcome per file.
///
/// `op` returns a short description of what it produced.
pub fn run_batch<F>(title: &str, inputs: &[InputFile], mut op: F) -> BatchReport
where
    F: FnMut(&InputFile) -> Result<String, ToolError>,
{
    let mut report = BatchReport::new(title);

    if inputs.is_empty() {
        log::warn!("{}: no input files", title);
        return report;
    }

    for input in inputs {
        log::info!("{}: processing {}", title, input.name);
        match op(input) {
            Ok(detail) => {
                log::info!("{}: {}", title, detail);
                report.record_done(&input.name, detail);
            }
            Err(e) => {
                log::warn!("{}: failed on {}: {}", title, input.name, e);
                report.record_failure(&input.name, e.to_string());
            }
        }
    }

    report
}
