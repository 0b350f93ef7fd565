//! Coded units: opaque chunks of compressed data.

use bytes::Bytes;

/// One self-contained chunk of compressed data, as produced by a unit
/// parser or an encode engine and consumed by a decode engine or an
/// output sink.
///
/// The payload is reference-counted; cloning a unit is cheap.
#[derive(Debug, Clone)]
pub struct CodedUnit {
    data: Bytes,
    pts: Option<i64>,
}

impl CodedUnit {
    /// Create a unit with an unknown timestamp.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pts: None,
        }
    }

    /// Create a unit carrying a presentation timestamp.
    pub fn with_pts(data: impl Into<Bytes>, pts: i64) -> Self {
        Self {
            data: data.into(),
            pts: Some(pts),
        }
    }

    /// Compressed payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation timestamp, if known.
    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    /// Set or clear the presentation timestamp.
    pub fn set_pts(&mut self, pts: Option<i64>) {
        self.pts = pts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_accessors() {
        let unit = CodedUnit::with_pts(vec![1u8, 2, 3], 42);
        assert_eq!(unit.data(), &[1, 2, 3]);
        assert_eq!(unit.len(), 3);
        assert!(!unit.is_empty());
        assert_eq!(unit.pts(), Some(42));

        let mut unit = CodedUnit::new(Vec::new());
        assert!(unit.is_empty());
        assert_eq!(unit.pts(), None);
        unit.set_pts(Some(7));
        assert_eq!(unit.pts(), Some(7));
    }
}
