use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum JtlError {
    /// The input cannot be parsed at all (e.g. a header without data rows).
    #[error("Structure error: {0}")]
    Structure(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("No results loaded")]
    NoDataset,
}

impl Serialize for JtlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_error_display() {
        let err = JtlError::Structure("only a header line".to_string());
        assert_eq!(err.to_string(), "Structure error: only a header line");
    }

    #[test]
    fn config_error_display() {
        let err = JtlError::Config("bucket_seconds must be positive".to_string());
        assert_eq!(err.to_string(), "Config error: bucket_seconds must be positive");
    }

    #[test]
    fn no_dataset_display() {
        assert_eq!(JtlError::NoDataset.to_string(), "No results loaded");
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: JtlError = io_err.into();
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn serde_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not valid json").unwrap_err();
        let err: JtlError = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn serialize_produces_string() {
        let err = JtlError::Structure("empty file".to_string());
        let json = serde_json::to_string(&err).expect("serialize should succeed");
        assert_eq!(json, "\"Structure error: empty file\"");
    }
}
