//! Lazy filesystem opening of NetCDF/HDF5 files and Zarr stores
//!
//! Only headers and sidecar metadata are read: dimensions, variables,
//! dtypes and attributes. Byte counts are computed from shapes and element
//! sizes, bulk array data stays on disk. Coordinate axes are the one
//! exception; they are small and are read so that axis ranges can be shown
//! and time axes decoded.

use crate::calendar::num_to_date;
use crate::dataset::{merge, Attrs, Backing, Coordinate, CoordValues, DataVariable, Dataset};
use crate::errors::{InspectorError, Result};
use crate::logging::Logger;
use netcdf::AttributeValue;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Open several filesystem entries as one combined dataset.
///
/// Identical coordinates collapse, differing variable sets union; a
/// conflict is an error. Any unreadable file propagates its error.
pub fn open_mfdataset(paths: &[String], logger: &Logger) -> Result<Dataset> {
    let mut datasets = Vec::with_capacity(paths.len());
    for path in paths {
        crate::debug_log!(logger, "opening {}", path);
        let entry = Path::new(path);
        let dset = if is_zarr_store(entry) {
            open_zarr(entry)?
        } else {
            open_netcdf(entry)?
        };
        datasets.push(dset);
    }
    merge(datasets)
}

fn is_zarr_store(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "zarr")
        || path.join(".zmetadata").is_file()
        || path.join(".zgroup").is_file()
}

/// Read the header of a NetCDF/HDF5 file into a dataset view.
fn open_netcdf(path: &Path) -> Result<Dataset> {
    let file = netcdf::open(path)?;

    let mut attrs = Attrs::new();
    for attr in file.attributes() {
        attrs.insert(attr.name().to_string(), attr_value_to_string(attr.value()?));
    }
    let mut dset = Dataset::new(attrs);

    let dim_names: Vec<String> = file.dimensions().map(|d| d.name().to_string()).collect();

    for var in file.variables() {
        let name = var.name().to_string();
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let dtype = format!("{:?}", var.vartype()).to_lowercase();
        let mut var_attrs = Attrs::new();
        for attr in var.attributes() {
            var_attrs.insert(attr.name().to_string(), attr_value_to_string(attr.value()?));
        }
        let total_elements: usize = shape.iter().product();
        let nbytes = (total_elements * element_size(&dtype)) as u64;

        let is_coordinate = dims.len() == 1 && dims[0] == name && dim_names.contains(&name);
        if is_coordinate {
            let values = read_axis_values(&var, &var_attrs, shape[0]);
            dset.add_coord(Coordinate {
                name,
                values,
                dtype,
                attrs: var_attrs,
                nbytes,
            });
        } else {
            dset.add_data_var(DataVariable {
                name,
                dims,
                shape,
                dtype,
                attrs: var_attrs,
                backing: Backing::File { nbytes },
            });
        }
    }

    Ok(dset)
}

/// Coordinate values, calendar-decoded when the axis carries CF time units.
fn read_axis_values(var: &netcdf::Variable, attrs: &Attrs, len: usize) -> CoordValues {
    let numbers: Vec<f64> = match var.get_values::<f64, _>(..) {
        Ok(numbers) => numbers,
        Err(_) => return CoordValues::Unread { len },
    };
    if let Some(units) = attrs.get("units").filter(|u| u.contains(" since ")) {
        let calendar = attrs
            .get("calendar")
            .cloned()
            .unwrap_or_else(|| "standard".to_string());
        if let Ok(dates) = num_to_date(&numbers, units, &calendar) {
            return CoordValues::Time(dates);
        }
    }
    CoordValues::Numeric(numbers)
}

/// Read a Zarr store from its JSON sidecar files.
fn open_zarr(path: &Path) -> Result<Dataset> {
    let mut dset = Dataset::new(read_zattrs(&path.join(".zattrs"))?);

    let entries = fs::read_dir(path).map_err(InspectorError::IoError)?;
    let mut arrays: Vec<std::path::PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.join(".zarray").is_file())
        .collect();
    arrays.sort();

    let mut coords: Vec<Coordinate> = Vec::new();
    let mut data_vars: Vec<DataVariable> = Vec::new();
    for array_path in arrays {
        let name = array_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let zarray: Value = serde_json::from_str(&fs::read_to_string(array_path.join(".zarray"))?)?;
        let shape: Vec<usize> = zarray["shape"]
            .as_array()
            .ok_or_else(|| {
                InspectorError::Generic(format!("Zarr array '{}' has no shape", name))
            })?
            .iter()
            .map(|v| v.as_u64().unwrap_or(0) as usize)
            .collect();
        let dtype = zarr_dtype_name(zarray["dtype"].as_str().unwrap_or("unknown"));

        let mut attrs = read_zattrs(&array_path.join(".zattrs"))?;
        let dims: Vec<String> = match attrs.remove("_ARRAY_DIMENSIONS") {
            Some(rendered) => serde_json::from_str::<Vec<String>>(&rendered)
                .unwrap_or_else(|_| vec![name.clone()]),
            None => (0..shape.len()).map(|i| format!("dim_{}", i)).collect(),
        };
        let total_elements: usize = shape.iter().product();
        let nbytes = (total_elements * element_size(&dtype)) as u64;

        // A sidecar can name the array as its own single dimension while
        // declaring a different rank; only a rank-1 shape is a coordinate
        if dims.len() == 1 && dims[0] == name && shape.len() == 1 {
            coords.push(Coordinate {
                name,
                values: CoordValues::Unread { len: shape[0] },
                dtype,
                attrs,
                nbytes,
            });
        } else {
            data_vars.push(DataVariable {
                name,
                dims,
                shape,
                dtype,
                attrs,
                backing: Backing::File { nbytes },
            });
        }
    }

    for coord in coords {
        dset.add_coord(coord);
    }
    for var in data_vars {
        dset.add_data_var(var);
    }
    Ok(dset)
}

/// Attributes from a `.zattrs` file; a missing file is an empty mapping.
fn read_zattrs(path: &Path) -> Result<Attrs> {
    if !path.is_file() {
        return Ok(Attrs::new());
    }
    let parsed: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let mut attrs = Attrs::new();
    if let Value::Object(map) = parsed {
        for (key, value) in map {
            let rendered = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            attrs.insert(key, rendered);
        }
    }
    Ok(attrs)
}

/// Human dtype name from a Zarr dtype spec like `<f8`.
fn zarr_dtype_name(dtype: &str) -> String {
    let spec = dtype.trim_start_matches(['<', '>', '|', '=']);
    match spec {
        "f8" => "float64".to_string(),
        "f4" => "float32".to_string(),
        "i8" => "int64".to_string(),
        "i4" => "int32".to_string(),
        "i2" => "int16".to_string(),
        "i1" => "int8".to_string(),
        "u1" => "uint8".to_string(),
        other => other.to_string(),
    }
}

/// Estimated element size in bytes from a dtype display name.
pub fn element_size(dtype: &str) -> usize {
    if dtype.contains("double") || dtype.contains("64") {
        8
    } else if dtype.contains("short") || dtype.contains("16") {
        2
    } else if dtype.contains("char") || dtype.contains("byte") || dtype.contains("8") {
        1
    } else if dtype.contains("float") || dtype.contains("int") || dtype.contains("32") {
        4
    } else {
        4
    }
}

/// Render a NetCDF attribute value for display.
pub fn attr_value_to_string(value: AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => s,
        AttributeValue::Strs(ss) => format!("{:?}", ss),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Floats(vs) => format!("{:?}", vs),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Doubles(vs) => format!("{:?}", vs),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Ints(vs) => format!("{:?}", vs),
        AttributeValue::Short(v) => v.to_string(),
        AttributeValue::Shorts(vs) => format!("{:?}", vs),
        AttributeValue::Uchar(v) => v.to_string(),
        AttributeValue::Uchars(vs) => format!("{:?}", vs),
        AttributeValue::Ushort(v) => v.to_string(),
        AttributeValue::Ushorts(vs) => format!("{:?}", vs),
        AttributeValue::Uint(v) => v.to_string(),
        AttributeValue::Uints(vs) => format!("{:?}", vs),
        other => format!("{:?}", other),
    }
}
