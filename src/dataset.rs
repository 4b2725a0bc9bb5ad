//! In-memory dataset model: coordinates, data variables and merging
//!
//! A [`Dataset`] only ever holds metadata and (small) coordinate axes.
//! Data variables are backed either by a file on disk, where the byte count
//! is taken from the header, or by a [`Backing::Virtual`] placeholder that
//! carries shape and dtype but can never be realized.

use crate::calendar::CalendarDate;
use crate::errors::{InspectorError, Result};
use std::collections::BTreeMap;

/// Attribute mapping; values are kept as display strings.
pub type Attrs = BTreeMap<String, String>;

/// Values of a coordinate axis.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordValues {
    /// Evenly spaced or file-read numeric values
    Numeric(Vec<f64>),
    /// Calendar-decoded time values
    Time(Vec<CalendarDate>),
    /// Known length but values not read (e.g. Zarr chunk data left on disk)
    Unread { len: usize },
}

impl CoordValues {
    pub fn len(&self) -> usize {
        match self {
            CoordValues::Numeric(v) => v.len(),
            CoordValues::Time(v) => v.len(),
            CoordValues::Unread { len } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named coordinate axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub name: String,
    pub values: CoordValues,
    pub dtype: String,
    pub attrs: Attrs,
    /// Bytes attributed to this axis; zero for archive-derived axes so that
    /// purely virtual datasets report zero computed bytes
    pub nbytes: u64,
}

/// What stands behind a data variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Backing {
    /// Data exists in a file; counted bytes come from the header, the
    /// values themselves are never loaded
    File { nbytes: u64 },
    /// Archive placeholder: shape and dtype only, never realizable
    Virtual,
}

/// A data variable: dims, shape, dtype and attributes, but no values.
#[derive(Debug, Clone, PartialEq)]
pub struct DataVariable {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub dtype: String,
    pub attrs: Attrs,
    pub backing: Backing,
}

impl DataVariable {
    /// Bytes counted towards the dataset size; virtual variables count zero.
    pub fn counted_bytes(&self) -> u64 {
        match self.backing {
            Backing::File { nbytes } => nbytes,
            Backing::Virtual => 0,
        }
    }
}

/// A collection of coordinates and data variables plus global attributes.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    coords: Vec<Coordinate>,
    data_vars: Vec<DataVariable>,
    pub attrs: Attrs,
}

impl Dataset {
    pub fn new(attrs: Attrs) -> Self {
        Self {
            coords: Vec::new(),
            data_vars: Vec::new(),
            attrs,
        }
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn data_vars(&self) -> &[DataVariable] {
        &self.data_vars
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|c| c.name == name)
    }

    pub fn data_var(&self, name: &str) -> Option<&DataVariable> {
        self.data_vars.iter().find(|v| v.name == name)
    }

    /// Append a coordinate, replacing any previous axis of the same name.
    pub fn add_coord(&mut self, coord: Coordinate) {
        if let Some(existing) = self.coords.iter_mut().find(|c| c.name == coord.name) {
            *existing = coord;
        } else {
            self.coords.push(coord);
        }
    }

    /// Append a data variable, replacing any previous one of the same name.
    pub fn add_data_var(&mut self, var: DataVariable) {
        if let Some(existing) = self.data_vars.iter_mut().find(|v| v.name == var.name) {
            *existing = var;
        } else {
            self.data_vars.push(var);
        }
    }

    /// Ordered union of dimension names and sizes, coordinates first.
    pub fn dim_sizes(&self) -> Vec<(String, usize)> {
        let mut dims: Vec<(String, usize)> = Vec::new();
        for coord in &self.coords {
            if !dims.iter().any(|(n, _)| n == &coord.name) {
                dims.push((coord.name.clone(), coord.values.len()));
            }
        }
        for var in &self.data_vars {
            for (dim, size) in var.dims.iter().zip(&var.shape) {
                if !dims.iter().any(|(n, _)| n == dim) {
                    dims.push((dim.clone(), *size));
                }
            }
        }
        dims
    }

    /// Total bytes of file-backed content. Virtual variables and
    /// archive-derived coordinates contribute nothing, so a dataset built
    /// entirely from archive metadata reports zero.
    pub fn nbytes(&self) -> u64 {
        let coord_bytes: u64 = self.coords.iter().map(|c| c.nbytes).sum();
        let var_bytes: u64 = self.data_vars.iter().map(|v| v.counted_bytes()).sum();
        coord_bytes + var_bytes
    }
}

/// Merge datasets by coordinate/variable name.
///
/// Coordinates and variables of the same name must agree on their values
/// and definition respectively; global attributes merge last-writer-wins
/// in input order.
pub fn merge(datasets: Vec<Dataset>) -> Result<Dataset> {
    let mut merged = Dataset::default();
    for dset in datasets {
        for attr in dset.attrs {
            merged.attrs.insert(attr.0, attr.1);
        }
        for coord in dset.coords {
            match merged.coords.iter_mut().find(|c| c.name == coord.name) {
                Some(existing) => {
                    if existing.values != coord.values {
                        return Err(InspectorError::MergeConflict {
                            name: coord.name,
                            message: "conflicting coordinate values".to_string(),
                        });
                    }
                    existing.attrs.extend(coord.attrs);
                }
                None => merged.coords.push(coord),
            }
        }
        for var in dset.data_vars {
            match merged.data_vars.iter_mut().find(|v| v.name == var.name) {
                Some(existing) => {
                    if existing.dims != var.dims
                        || existing.shape != var.shape
                        || existing.dtype != var.dtype
                    {
                        return Err(InspectorError::MergeConflict {
                            name: var.name,
                            message: "conflicting variable definitions".to_string(),
                        });
                    }
                    existing.attrs.extend(var.attrs);
                }
                None => merged.data_vars.push(var),
            }
        }
    }
    Ok(merged)
}
