//! StrongLink (slk) archive service client
//!
//! The archive is reachable through the `slk`/`slk_helpers` command line
//! tools and a small REST authentication endpoint. This module handles the
//! session lifecycle and turns the nearly-YAML output of
//! `slk_helpers metadata` into a key-value record.

use crate::errors::{InspectorError, Result};
use crate::format::human_size;
use crate::logging::Logger;
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const SLK: &str = "slk";
const SLK_HELPERS: &str = "slk_helpers";
const AUTH_URL: &str = "https://archive.dkrz.de/api/v2/authentication";
const SESSION_DATE_FMT: &str = "%a %b %d %H:%M:%S %Y";

/// One raw metadata record: group name -> key-value pairs.
pub type MetadataRecord = HashMap<String, HashMap<String, String>>;

/// Contents of `~/.slk/config.json`.
#[derive(Debug, Serialize, Deserialize)]
struct SessionConfig {
    user: String,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "expireDate")]
    expire_date: String,
}

fn session_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.slk/config.json").to_string())
}

/// Expiration date of the current session key; a missing or unparsable
/// session file counts as already expired.
pub fn expiration_date() -> NaiveDateTime {
    expiration_date_at(&session_path())
}

/// Expiration date read from an explicit session file location.
pub fn expiration_date_at(path: &Path) -> NaiveDateTime {
    let now = Local::now().naive_local();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return now,
    };
    let config: SessionConfig = match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(_) => return now,
    };
    parse_session_date(&config.expire_date).unwrap_or(now)
}

/// Parse the session date, with or without the timezone abbreviation slk
/// writes (`Mon Jan 02 15:04:05 CET 2006`).
pub fn parse_session_date(date: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(date, SESSION_DATE_FMT) {
        return Some(parsed);
    }
    let tokens: Vec<&str> = date.split_whitespace().collect();
    if tokens.len() == 6 {
        let mut without_tz = tokens.clone();
        without_tz.remove(4);
        return NaiveDateTime::parse_from_str(&without_tz.join(" "), SESSION_DATE_FMT).ok();
    }
    None
}

/// Login to the archive. Idempotent: a still-valid session is left alone.
///
/// With `SLK_PASSWD` set the REST endpoint is used non-interactively;
/// otherwise an expired session falls back to the interactive `slk login`.
pub fn login(logger: &Logger) -> Result<()> {
    let passwd = env::var("SLK_PASSWD").ok().filter(|p| !p.is_empty());
    if let Some(passwd) = passwd {
        crate::debug_log!(logger, "authenticating against {}", AUTH_URL);
        return login_via_request(&passwd);
    }
    let remaining = expiration_date() - Local::now().naive_local();
    if remaining <= Duration::zero() {
        crate::debug_log!(logger, "session expired, running interactive `slk login`");
        eprintln!("Your session has expired, login to slk");
        let status = Command::new(SLK)
            .arg("login")
            .status()
            .map_err(|e| InspectorError::AuthError(format!("could not run slk login: {}", e)))?;
        if !status.success() {
            return Err(InspectorError::AuthError("slk login failed".to_string()));
        }
    }
    Ok(())
}

fn login_via_request(passwd: &str) -> Result<()> {
    let user = env::var("USER").unwrap_or_default();
    let body = serde_json::json!({
        "data": {
            "attributes": {
                "domain": "ldap",
                "name": user,
                "password": passwd,
            },
            "type": "authentication",
        }
    });
    let client = reqwest::blocking::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()?;
    let response: serde_json::Value = client.post(AUTH_URL).json(&body).send()?.json()?;
    let key = response["data"]["attributes"]["session_key"]
        .as_str()
        .unwrap_or("");
    if key.is_empty() {
        return Err(InspectorError::AuthError(
            "archive did not return a session key".to_string(),
        ));
    }
    let expire_date = (Local::now() + Duration::days(20))
        .format(SESSION_DATE_FMT)
        .to_string();
    let config = SessionConfig {
        user,
        session_key: key.to_string(),
        expire_date,
    };
    let path = session_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string(&config)?)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Size of an archive object, human-rendered; failures degrade to "unknown".
pub fn get_file_size(input_path: &str) -> String {
    let output = match run_helpers(&["size", input_path]) {
        Ok(output) => output,
        Err(_) => return "unknown".to_string(),
    };
    match output.trim().parse::<u64>() {
        Ok(bytes) => human_size(bytes),
        Err(_) => "unknown".to_string(),
    }
}

/// Raw metadata record for an archive path.
pub fn get_metadata(input_path: &str, logger: &Logger) -> Result<MetadataRecord> {
    crate::debug_log!(logger, "querying archive metadata for {}", input_path);
    let output = run_helpers(&["metadata", input_path])?;
    let mut record = parse_metadata_output(&output);
    record
        .entry("netcdf".to_string())
        .or_default()
        .insert("file_size".to_string(), get_file_size(input_path));
    Ok(record)
}

fn run_helpers(args: &[&str]) -> Result<String> {
    let output = Command::new(SLK_HELPERS)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            InspectorError::ArchiveError(format!("could not run {}: {}", SLK_HELPERS, e))
        })?;
    if !output.status.success() {
        return Err(InspectorError::ArchiveError(format!(
            "{} {} failed: {}",
            SLK_HELPERS,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse the nearly-YAML output of `slk_helpers metadata`.
///
/// Unindented lines starting with `netcdf` or `document` open a group,
/// indented `key: value` lines belong to the current group, and remaining
/// non-empty lines continue the previous value.
pub fn parse_metadata_output(output: &str) -> MetadataRecord {
    let mut record: MetadataRecord = MetadataRecord::new();
    record.entry("netcdf".to_string()).or_default();
    let mut group: Option<String> = None;
    let mut current_key: Option<String> = None;

    for line in output.lines() {
        if line.starts_with("netcdf") || line.starts_with("document") {
            let name = line.trim().to_string();
            record.entry(name.clone()).or_default();
            group = Some(name);
            current_key = None;
            continue;
        }
        let Some(group_name) = group.as_ref() else {
            continue;
        };
        if line.is_empty() {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            let (key, value) = match line.split_once(':') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (line.trim().to_string(), String::new()),
            };
            if let Some(entries) = record.get_mut(group_name) {
                entries.insert(key.clone(), value);
            }
            current_key = Some(key);
        } else if let Some(key) = current_key.as_ref() {
            // Continuation of an overlong value
            if let Some(value) = record.get_mut(group_name).and_then(|g| g.get_mut(key)) {
                value.push_str(line.trim());
            }
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_groups() {
        let output = "document\n  Version: 1\n  Keywords: {}\nnetcdf\n  id: tas\n";
        let record = parse_metadata_output(output);
        assert_eq!(
            record["document"].get("Version").map(String::as_str),
            Some("1")
        );
        assert_eq!(record["netcdf"].get("id").map(String::as_str), Some("tas"));
    }

    #[test]
    fn test_parse_metadata_continuation_lines() {
        let output = "netcdf\n  history: first part\nsecond part\n";
        // "second part" is unindented and not a group header, so it extends
        // the previous value
        let record = parse_metadata_output(output);
        assert_eq!(
            record["netcdf"].get("history").map(String::as_str),
            Some("first partsecond part")
        );
    }

    #[test]
    fn test_parse_metadata_always_has_netcdf_group() {
        let record = parse_metadata_output("");
        assert!(record.contains_key("netcdf"));
    }

    #[test]
    fn test_missing_session_file_counts_as_expired() {
        let expiry = expiration_date_at(Path::new("/no/such/dir/config.json"));
        assert!(expiry <= Local::now().naive_local());
    }

    #[test]
    fn test_unparsable_session_file_counts_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(expiration_date_at(&path) <= Local::now().naive_local());
    }

    #[test]
    fn test_parse_session_date_formats() {
        assert!(parse_session_date("Mon Jan 02 15:04:05 2006").is_some());
        assert!(parse_session_date("Mon Jan 02 15:04:05 CET 2006").is_some());
        assert!(parse_session_date("not a date").is_none());
    }
}
