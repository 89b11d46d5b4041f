//! Parameters bound from the inbound path.

use std::fmt;
use std::num::NonZeroU64;

use crate::gateway::error::GatewayError;

/// Identifier of one upstream deposition.
///
/// Zero never constructs a reference: an id of 0 means "the collection".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepositionReference(NonZeroU64);

impl DepositionReference {
    /// `None` for 0.
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Unwrap an optional reference for operations that need one record.
    pub fn require(reference: Option<Self>) -> Result<Self, GatewayError> {
        reference.ok_or_else(|| GatewayError::Binding("deposition id is required".to_string()))
    }
}

impl fmt::Display for DepositionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload destination inside a deposition's bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub bucket: String,
    pub file_name: String,
}

impl FileTarget {
    /// Both segments must be present, non-empty, free of `/` and not a dot
    /// segment (`.` or `..` would be collapsed out of the upstream path).
    pub fn bind(bucket: Option<&str>, file_name: Option<&str>) -> Result<Self, GatewayError> {
        let bucket = segment("bucket", bucket)?;
        let file_name = segment("file", file_name)?;
        Ok(Self {
            bucket: bucket.to_string(),
            file_name: file_name.to_string(),
        })
    }

    /// Split a captured `bucket/file` tail into its two optional segments.
    pub fn split_tail(tail: &str) -> (Option<&str>, Option<&str>) {
        match tail.split_once('/') {
            Some((bucket, file_name)) => (Some(bucket), Some(file_name)),
            None => (Some(tail), None),
        }
    }
}

fn segment<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, GatewayError> {
    match value {
        None | Some("") => Err(GatewayError::Binding(format!("missing '{name}' path segment"))),
        Some(v) if v.contains('/') => Err(GatewayError::Binding(format!(
            "'{name}' must be a single path segment"
        ))),
        Some("." | "..") => Err(GatewayError::Binding(format!(
            "'{name}' must not be a dot segment"
        ))),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_absent() {
        assert_eq!(DepositionReference::new(0), None);
        assert_eq!(DepositionReference::new(42).map(DepositionReference::get), Some(42));
    }

    #[test]
    fn test_require() {
        assert!(matches!(
            DepositionReference::require(None),
            Err(GatewayError::Binding(_))
        ));
        let id = DepositionReference::new(7);
        assert_eq!(DepositionReference::require(id).unwrap().get(), 7);
    }

    #[test]
    fn test_file_target_binding() {
        let target = FileTarget::bind(Some("b-1"), Some("readme.md")).unwrap();
        assert_eq!(target.bucket, "b-1");
        assert_eq!(target.file_name, "readme.md");

        assert!(FileTarget::bind(None, Some("readme.md")).is_err());
        assert!(FileTarget::bind(Some("b-1"), None).is_err());
        assert!(FileTarget::bind(Some(""), Some("readme.md")).is_err());
        assert!(FileTarget::bind(Some("b-1"), Some("dir/readme.md")).is_err());
    }

    #[test]
    fn test_file_target_rejects_dot_segments() {
        for (bucket, file) in [("b-1", ".."), ("b-1", "."), ("..", "readme.md"), (".", "readme.md")] {
            let err = FileTarget::bind(Some(bucket), Some(file)).unwrap_err();
            assert_eq!(err.kind(), "binding_error", "{bucket}/{file}");
        }
        assert!(FileTarget::bind(Some("b-1"), Some("..readme")).is_ok());
        assert!(FileTarget::bind(Some("b-1"), Some(".hidden")).is_ok());
    }

    #[test]
    fn test_split_tail() {
        assert_eq!(FileTarget::split_tail("b/f.txt"), (Some("b"), Some("f.txt")));
        assert_eq!(FileTarget::split_tail("b"), (Some("b"), None));
        assert_eq!(FileTarget::split_tail("b/"), (Some("b"), Some("")));
        assert_eq!(FileTarget::split_tail("b/d/f"), (Some("b"), Some("d/f")));
    }
}
