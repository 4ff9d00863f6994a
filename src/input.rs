//! Input loading for the command line
//!
//! Reads JSON from a file or stdin and parses it into result records. The
//! input may be a single record, an array of records, or an RSpec JSON
//! report with an `examples` array.

use std::io::Read;
use std::path::{Path, PathBuf};

use htmlmsg_core::prelude::*;
use htmlmsg_core::{parse_records, ResultRecord};

/// Where the JSON input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// Source for a command-line path; no path or `-` means stdin
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => InputSource::File(path.to_path_buf()),
            _ => InputSource::Stdin,
        }
    }

    /// Name used in error messages
    pub fn name(&self) -> String {
        match self {
            InputSource::Stdin => "<stdin>".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }

    pub fn read_to_string(&self) -> Result<String> {
        match self {
            InputSource::Stdin => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
            InputSource::File(path) => Ok(std::fs::read_to_string(path)?),
        }
    }
}

/// Read and parse every record from `source`
pub fn load_records(source: &InputSource) -> Result<Vec<ResultRecord>> {
    let text = source
        .read_to_string()
        .map_err(|e| Error::input(source.name(), e.to_string()))?;

    let records = parse_str(&text).map_err(|e| Error::input(source.name(), e.to_string()))?;
    debug!("Loaded {} record(s) from {}", records.len(), source.name());
    Ok(records)
}

/// Parse records from JSON text
pub fn parse_str(text: &str) -> Result<Vec<ResultRecord>> {
    if text.trim().is_empty() {
        return Err(Error::invalid_record("input is empty"));
    }
    parse_records(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_source_from_arg() {
        assert_eq!(InputSource::from_arg(None), InputSource::Stdin);
        assert_eq!(InputSource::from_arg(Some(Path::new("-"))), InputSource::Stdin);
        assert_eq!(
            InputSource::from_arg(Some(Path::new("report.json"))),
            InputSource::File(PathBuf::from("report.json"))
        );
    }

    #[test]
    fn test_load_records_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("report.json");
        std::fs::write(
            &path,
            r#"{"version": "3.13.0", "examples": [{"status": "passed"}, {"status": "failed"}]}"#,
        )
        .unwrap();

        let records = load_records(&InputSource::File(path)).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let temp = tempdir().unwrap();
        let err = load_records(&InputSource::File(temp.path().join("nope.json"))).unwrap_err();

        assert!(matches!(err, Error::Input { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_invalid_json_is_input_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_records(&InputSource::File(path)).unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = parse_str("  \n").unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }

    #[test]
    fn test_scalar_input_rejected() {
        let err = parse_str("42").unwrap_err();
        assert!(err.to_string().contains("a number"));
    }
}
