//! Entry point for the metadata-inspector application.
//! Parses the CLI, runs one inspection and prints the single resulting
//! message to the stream it belongs on.

use clap::Parser;
use metadata_inspector::cli::Args;
use metadata_inspector::inspect::{inspect, OutputStream};
use metadata_inspector::logging::{LogLevel, Logger};

fn main() {
    let args = Args::parse();
    let logger = Logger::new(LogLevel::from_verbose(args.verbose));

    let (message, stream) = inspect(&args.input, args.html, &logger);
    match stream {
        OutputStream::Stdout => println!("{}", message),
        OutputStream::Stderr => eprintln!("{}", message),
    }
}
