//! Virtual dataset reconstruction from archive metadata
//!
//! Files on the HSM tape tier cannot be opened; their shape is rebuilt
//! purely from the `document.Keywords` JSON stored alongside them.
//! Dimension axes become computed linspace (or calendar) values, data
//! variables become placeholder arrays that are never materialized.

use crate::calendar::num_to_date;
use crate::dataset::{Attrs, Backing, Coordinate, CoordValues, DataVariable, Dataset};
use crate::errors::{InspectorError, Result};
use crate::logging::Logger;
use crate::slk::{self, MetadataRecord};
use ndarray::Array1;
use serde_json::{Map, Value};

/// Query the archive for one path and rebuild a dataset view from it.
pub fn dataset_from_hsm(input_path: &str, logger: &Logger) -> Result<Dataset> {
    let record = slk::get_metadata(input_path, logger)?;
    dataset_from_record(record)
}

/// Rebuild a dataset view from a raw metadata record.
pub fn dataset_from_record(mut record: MetadataRecord) -> Result<Dataset> {
    let keywords_json = record
        .get_mut("document")
        .and_then(|doc| doc.remove("Keywords"))
        .unwrap_or_else(|| "{}".to_string());
    let mut keywords: Map<String, Value> = serde_json::from_str(&keywords_json)?;

    let global_attrs = take_object(&mut keywords, "global");
    let attrs = if global_attrs.is_empty() {
        // Older entries carry no structured global attributes; fall back to
        // the raw netcdf groups, netcdf_header winning on collisions
        let mut nc_attrs = Attrs::new();
        for group in ["netcdf", "netcdf_header"] {
            if let Some(entries) = record.get(group) {
                for (key, value) in entries {
                    nc_attrs.insert(key.clone(), value.clone());
                }
            }
        }
        nc_attrs
    } else {
        stringify_attrs(global_attrs)
    };

    let mut dset = Dataset::new(attrs);

    for dim in take_string_list(&mut keywords, "dims") {
        let mut entry = take_object(&mut keywords, &dim);
        let size = pop_usize(&mut entry, "size", &dim)?;
        let start = pop_f64(&mut entry, "start", &dim)?;
        let end = pop_f64(&mut entry, "end", &dim)?;
        let numbers = Array1::linspace(start, end, size).to_vec();
        let (values, dtype) = if dim == "time" {
            let units = get_str(&entry, "units", &dim)?;
            let calendar = get_str(&entry, "calendar", &dim)?;
            (
                CoordValues::Time(num_to_date(&numbers, &units, &calendar)?),
                "datetime64".to_string(),
            )
        } else {
            (CoordValues::Numeric(numbers), "float64".to_string())
        };
        dset.add_coord(Coordinate {
            name: dim,
            values,
            dtype,
            attrs: stringify_attrs(entry),
            nbytes: 0,
        });
    }

    for var in take_string_list(&mut keywords, "data_vars") {
        let mut entry = take_object(&mut keywords, &var);
        let dims = pop_string_list(&mut entry, "dims");
        let shape = dims
            .iter()
            .map(|dim| {
                dset.coord(dim)
                    .map(|c| c.values.len())
                    .ok_or_else(|| InspectorError::DimensionNotFound {
                        var: var.clone(),
                        dim: dim.clone(),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;
        dset.add_data_var(DataVariable {
            name: var,
            dims,
            shape,
            dtype: "float64".to_string(),
            attrs: stringify_attrs(entry),
            backing: Backing::Virtual,
        });
    }

    Ok(dset)
}

/// Remove a key and return it as an object; anything else yields empty.
fn take_object(keywords: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match keywords.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Remove a key and return it as a list of strings.
fn take_string_list(keywords: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match keywords.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn pop_string_list(entry: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match entry.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn pop_f64(entry: &mut Map<String, Value>, key: &str, dim: &str) -> Result<f64> {
    let value = entry.remove(key).ok_or_else(|| {
        InspectorError::ArchiveError(format!("dimension '{}' is missing '{}'", dim, key))
    })?;
    json_to_f64(&value).ok_or_else(|| {
        InspectorError::ArchiveError(format!(
            "dimension '{}' has non-numeric '{}': {}",
            dim, key, value
        ))
    })
}

fn pop_usize(entry: &mut Map<String, Value>, key: &str, dim: &str) -> Result<usize> {
    let value = pop_f64(entry, key, dim)?;
    Ok(value as usize)
}

fn get_str(entry: &Map<String, Value>, key: &str, dim: &str) -> Result<String> {
    match entry.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(InspectorError::ArchiveError(format!(
            "dimension '{}' is missing '{}'",
            dim, key
        ))),
    }
}

/// Numbers may arrive as JSON numbers or as quoted strings.
fn json_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn stringify_attrs(entry: Map<String, Value>) -> Attrs {
    entry
        .into_iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record_with_keywords(keywords: &str) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        let mut document = HashMap::new();
        document.insert("Keywords".to_string(), keywords.to_string());
        record.insert("document".to_string(), document);
        record
    }

    #[test]
    fn test_time_dimension_is_calendar_decoded() {
        let keywords = r#"{
            "global": {"Conventions": "CF-1.7"},
            "dims": ["time"],
            "time": {
                "size": 3, "start": 0, "end": 2,
                "units": "days since 2000-01-01", "calendar": "standard"
            }
        }"#;
        let dset = dataset_from_record(record_with_keywords(keywords)).unwrap();
        let time = dset.coord("time").unwrap();
        match &time.values {
            CoordValues::Time(dates) => {
                assert_eq!(dates.len(), 3);
                assert_eq!(dates[0].to_string(), "2000-01-01");
                assert_eq!(dates[2].to_string(), "2000-01-03");
            }
            other => panic!("expected time values, got {:?}", other),
        }
        assert_eq!(
            time.attrs.get("units").map(String::as_str),
            Some("days since 2000-01-01")
        );
    }

    #[test]
    fn test_unknown_dimension_reference_fails() {
        let keywords = r#"{
            "dims": [],
            "data_vars": ["tas"],
            "tas": {"dims": ["time"], "units": "K"}
        }"#;
        let result = dataset_from_record(record_with_keywords(keywords));
        assert!(matches!(
            result,
            Err(InspectorError::DimensionNotFound { ref var, ref dim })
                if var == "tas" && dim == "time"
        ));
    }

    #[test]
    fn test_variable_shape_follows_dimensions() {
        let keywords = r#"{
            "dims": ["lat", "lon"],
            "lat": {"size": 10, "start": -90, "end": 90},
            "lon": {"size": "20", "start": "0", "end": "360"},
            "data_vars": ["tas"],
            "tas": {"dims": ["lat", "lon"], "units": "K"}
        }"#;
        let dset = dataset_from_record(record_with_keywords(keywords)).unwrap();
        let tas = dset.data_var("tas").unwrap();
        assert_eq!(tas.shape, vec![10, 20]);
        assert_eq!(tas.backing, Backing::Virtual);
        assert_eq!(tas.attrs.get("units").map(String::as_str), Some("K"));
        assert_eq!(dset.nbytes(), 0);
    }

    #[test]
    fn test_global_attrs_fall_back_to_netcdf_groups() {
        let mut record = record_with_keywords(r#"{"dims": []}"#);
        let mut netcdf = HashMap::new();
        netcdf.insert("institution".to_string(), "from-netcdf".to_string());
        netcdf.insert("file_size".to_string(), "2 MB".to_string());
        record.insert("netcdf".to_string(), netcdf);
        let mut header = HashMap::new();
        header.insert("institution".to_string(), "from-header".to_string());
        record.insert("netcdf_header".to_string(), header);

        let dset = dataset_from_record(record).unwrap();
        // netcdf_header wins on collision, file_size passes through
        assert_eq!(
            dset.attrs.get("institution").map(String::as_str),
            Some("from-header")
        );
        assert_eq!(dset.attrs.get("file_size").map(String::as_str), Some("2 MB"));
    }

    #[test]
    fn test_missing_keywords_yields_empty_dataset() {
        let record = MetadataRecord::new();
        let dset = dataset_from_record(record).unwrap();
        assert!(dset.coords().is_empty());
        assert!(dset.data_vars().is_empty());
    }
}
