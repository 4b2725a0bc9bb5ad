//! Defines command-line interface options using `clap`.

use clap::Parser;

/// A CLI tool for inspecting metadata of weather/climate datasets
#[derive(Parser, Debug)]
#[command(
    name = "metadata-inspector",
    version,
    about = "Inspect meta data of weather/climate datasets on disk or in the HSM archive"
)]
pub struct Args {
    /// Input files that will be processed
    #[arg(required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Create html representation of the dataset.
    #[arg(long)]
    pub html: bool,

    /// Turn on debug mode for more information.
    #[arg(short, long)]
    pub verbose: bool,
}
