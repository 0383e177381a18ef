use serde::{Deserialize, Serialize};

use crate::{CoreError, PageId, PagePath};

/// Editor-authored page layout. Its shape belongs to the editor, so it is
/// kept as a dynamically-typed JSON value.
pub type PageData = serde_json::Value;

/// One stored page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub path: PagePath,
    pub data: PageData,
    pub revision: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

/// Listing entry for a stored page, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: PageId,
    pub path: PagePath,
    pub revision: u64,
    pub updated_at_ms: u64,
}

/// Deepest container nesting accepted in page data. MessagePack decoding
/// refuses input nested beyond 1024 levels and decodes recursively, so deeper
/// documents are rejected before they are stored.
pub const MAX_DATA_DEPTH: usize = 256;

/// Container nesting depth of `data`; scalars have depth 0.
pub fn nesting_depth(data: &PageData) -> usize {
    let mut max = 0;
    let mut stack = vec![(data, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        let depth = depth + 1;
        match value {
            PageData::Array(items) => stack.extend(items.iter().map(|child| (child, depth))),
            PageData::Object(fields) => stack.extend(fields.values().map(|child| (child, depth))),
            _ => continue,
        }
        max = max.max(depth);
    }
    max
}

/// Page data in its persisted form: MessagePack bytes plus a BLAKE3 checksum
/// of those bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedData {
    pub bytes: Vec<u8>,
    pub checksum: [u8; 32],
}

impl EncodedData {
    pub fn encode(data: &PageData) -> Result<Self, CoreError> {
        let depth = nesting_depth(data);
        if depth > MAX_DATA_DEPTH {
            return Err(CoreError::InvalidData(format!(
                "page data nested {depth} levels deep (max {MAX_DATA_DEPTH})"
            )));
        }
        let bytes = rmp_serde::to_vec(data).map_err(|e| CoreError::Serialization(e.to_string()))?;
        let checksum = *blake3::hash(&bytes).as_bytes();
        Ok(Self { bytes, checksum })
    }

    /// Returns true if the stored checksum matches the bytes.
    pub fn verify(&self) -> bool {
        blake3::hash(&self.bytes).as_bytes() == &self.checksum
    }

    pub fn decode(&self) -> Result<PageData, CoreError> {
        if !self.verify() {
            return Err(CoreError::ChecksumMismatch);
        }
        rmp_serde::from_slice(&self.bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_editor_document_survives_encoding() {
        let data = json!({
            "content": [
                {"type": "Hero", "props": {"title": "Welcome", "id": "Hero-1"}},
                {"type": "Columns", "props": {"items": [[], [{"type": "Text"}]]}}
            ],
            "root": {"props": {"title": "Home"}},
            "zones": {},
            "version": 3,
            "ratio": 0.5,
            "draft": false,
            "note": null
        });
        let encoded = EncodedData::encode(&data).unwrap();
        assert!(encoded.verify());
        assert_eq!(encoded.decode().unwrap(), data);
    }

    #[test]
    fn tampered_bytes_fail_verification() {
        let mut encoded = EncodedData::encode(&json!({"blocks": ["a"]})).unwrap();
        let last = encoded.bytes.len() - 1;
        encoded.bytes[last] ^= 0xff;
        assert!(!encoded.verify());
        assert!(matches!(encoded.decode(), Err(CoreError::ChecksumMismatch)));
    }

    #[test]
    fn scalar_documents_are_allowed() {
        for data in [json!(null), json!(42), json!("text"), json!([1, 2, 3])] {
            let encoded = EncodedData::encode(&data).unwrap();
            assert_eq!(encoded.decode().unwrap(), data);
        }
    }

    fn nested_arrays(levels: usize) -> PageData {
        let mut data = json!("leaf");
        for _ in 0..levels {
            data = PageData::Array(vec![data]);
        }
        data
    }

    #[test]
    fn depth_counts_containers() {
        assert_eq!(nesting_depth(&json!(1)), 0);
        assert_eq!(nesting_depth(&json!([])), 1);
        assert_eq!(nesting_depth(&json!({"a": [1, {"b": {}}], "c": 2})), 3);
        assert_eq!(nesting_depth(&nested_arrays(700)), 700);
    }

    #[test]
    fn deepest_accepted_document_decodes() {
        let data = nested_arrays(MAX_DATA_DEPTH);
        let encoded = EncodedData::encode(&data).unwrap();
        assert_eq!(encoded.decode().unwrap(), data);
    }

    #[test]
    fn over_deep_document_rejected_on_encode() {
        let err = EncodedData::encode(&nested_arrays(MAX_DATA_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidData(_)));
    }
}
