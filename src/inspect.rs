//! Top-level flow: classify inputs, open datasets, merge, render
//!
//! The result of one invocation is always exactly one message paired with
//! the stream it belongs on. Processing errors go to stderr in plain mode;
//! in HTML mode they go to stdout so HTML consumers always receive
//! renderable markup.

use crate::dataset::{merge, Dataset};
use crate::errors::Result;
use crate::format::{apply_substitutions, dataset_repr, dataset_repr_html, human_size, FormatOptions};
use crate::hsm_io::dataset_from_hsm;
use crate::logging::Logger;
use crate::netcdf_io::open_mfdataset;
use crate::paths::{Classifier, ClassifiedPaths};
use crate::{debug_log, error_log, slk};

/// Where the final message belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

const NO_FILES_MSG: &str = "No files found";
const CORRUPTED_HEADER: &str = "No data found, file(s) might be corrupted. See err. message below:";
const HTML_ERROR_MSG: &str = "<p><b>Error:</b> Could not open dataset, for more details \
                              do not use the --html flag.</p>";

/// Inspect the given input specifiers and produce the message to print.
pub fn inspect(inputs: &[String], html: bool, logger: &Logger) -> (String, OutputStream) {
    let classified = Classifier::default().classify(inputs);
    debug_log!(
        logger,
        "classified {} filesystem and {} archive path(s)",
        classified.filesystem.len(),
        classified.archive.len()
    );
    if classified.is_empty() {
        return (NO_FILES_MSG.to_string(), OutputStream::Stderr);
    }

    // Authentication failures are fatal, not a corrupted-file condition
    if !classified.archive.is_empty() {
        if let Err(error) = slk::login(logger) {
            error_log!(logger, "{}", error);
            return (format!("Error: {}", error), OutputStream::Stderr);
        }
    }

    match open_datasets(&classified, logger) {
        Ok(mut dset) => {
            let fsize = if dset.nbytes() == 0 {
                dset.attrs
                    .remove("file_size")
                    .unwrap_or_else(|| "unknown".to_string())
            } else {
                human_size(dset.nbytes())
            };
            let title = format!("Dataset (dataset-size: {})", fsize);
            let rendered = if html {
                dataset_repr_html(&dset, &title)
            } else {
                dataset_repr(&dset, &title, &FormatOptions::default())
            };
            (apply_substitutions(&rendered), OutputStream::Stdout)
        }
        Err(error) => {
            error_log!(logger, "{}", error);
            if html {
                (HTML_ERROR_MSG.to_string(), OutputStream::Stdout)
            } else {
                (
                    format!("{}\n{}", CORRUPTED_HEADER, error),
                    OutputStream::Stderr,
                )
            }
        }
    }
}

/// Open filesystem files and reconstruct archive entries, then merge.
fn open_datasets(classified: &ClassifiedPaths, logger: &Logger) -> Result<Dataset> {
    let mut datasets: Vec<Dataset> = Vec::new();
    if !classified.filesystem.is_empty() {
        datasets.push(open_mfdataset(&classified.filesystem, logger)?);
    }
    for input_path in &classified.archive {
        datasets.push(dataset_from_hsm(input_path, logger)?);
    }
    merge(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, Logger};

    #[test]
    fn test_no_resolvable_inputs_goes_to_stderr() {
        let logger = Logger::new(LogLevel::Quiet);
        // A directory with no dataset files classifies to nothing
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![dir.path().to_string_lossy().to_string()];
        let (msg, stream) = inspect(&inputs, false, &logger);
        assert_eq!(msg, "No files found");
        assert_eq!(stream, OutputStream::Stderr);
    }

    #[test]
    fn test_unreadable_file_plain_mode_goes_to_stderr() {
        let logger = Logger::new(LogLevel::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.nc");
        std::fs::write(&bogus, b"not a netcdf file").unwrap();
        let inputs = vec![bogus.to_string_lossy().to_string()];
        let (msg, stream) = inspect(&inputs, false, &logger);
        assert!(msg.starts_with("No data found, file(s) might be corrupted."));
        assert_eq!(stream, OutputStream::Stderr);
    }

    #[test]
    fn test_unreadable_file_html_mode_goes_to_stdout() {
        let logger = Logger::new(LogLevel::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.nc");
        std::fs::write(&bogus, b"not a netcdf file").unwrap();
        let inputs = vec![bogus.to_string_lossy().to_string()];
        let (msg, stream) = inspect(&inputs, true, &logger);
        assert!(msg.contains("do not use the --html flag"));
        assert_eq!(stream, OutputStream::Stdout);
    }
}
