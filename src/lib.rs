//! metadata-inspector: dataset metadata inspection for disk and tape
//!
//! A small library behind the `metadata-inspector` CLI. It answers "what is
//! in this file/archive entry?" for NetCDF/HDF5/Zarr-style datasets without
//! loading bulk array data: filesystem files are opened header-only, and
//! entries on the HSM tape tier are rebuilt as virtual datasets purely from
//! the archive's sidecar metadata.
//!
//! ## Module Organization
//!
//! - [`paths`]: classification of input specifiers into filesystem and
//!   archive paths
//! - [`netcdf_io`]: lazy header-only opening of NetCDF/HDF5 files and Zarr
//!   stores
//! - [`slk`]: StrongLink archive client (session handling, metadata query)
//! - [`hsm_io`]: virtual dataset reconstruction from archive metadata
//! - [`dataset`]: the dataset model and merging
//! - [`calendar`]: CF time axis decoding
//! - [`format`]: text/HTML rendering and human-readable sizes
//! - [`inspect`]: the top-level classify, open, merge, render flow
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use metadata_inspector::prelude::*;
//!
//! let logger = Logger::new(LogLevel::Quiet);
//! let inputs = vec!["data/tas_2000.nc".to_string()];
//! let (message, stream) = metadata_inspector::inspect::inspect(&inputs, false, &logger);
//! assert!(matches!(stream, OutputStream::Stdout | OutputStream::Stderr));
//! println!("{}", message);
//! ```

// Core modules
pub mod calendar;
pub mod cli;
pub mod dataset;
pub mod errors;
pub mod format;
pub mod hsm_io;
pub mod inspect;
pub mod logging;
pub mod netcdf_io;
pub mod paths;
pub mod slk;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::dataset::{merge, Backing, Coordinate, CoordValues, DataVariable, Dataset};
    pub use crate::errors::{InspectorError, Result};
    pub use crate::format::{human_size, FormatOptions};
    pub use crate::inspect::{inspect, OutputStream};
    pub use crate::logging::{LogLevel, Logger};
    pub use crate::paths::{Classifier, ClassifiedPaths};
}
