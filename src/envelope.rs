use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// The shaped pagination result produced by the paging stages: one page of
/// documents plus bookkeeping computed against the whole filtered set.
///
/// `docs` and `total_docs` come from two branches of the same `$facet`
/// split, so they can never disagree about which documents were counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    pub docs: Vec<Value>,
    pub total_docs: u64,
    pub total_pages: u64,
    pub page: u64,
    pub limit: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl PageEnvelope {
    /// Decode the first aggregation result document into an envelope.
    /// Fields added by extra post-stages are ignored.
    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc).map_err(Error::InvalidEnvelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_wire_names() {
        let envelope = PageEnvelope::from_document(json!({
            "docs": [{ "title": "Book #11" }],
            "totalDocs": 100,
            "totalPages": 10,
            "page": 2,
            "limit": 10,
            "hasPrevPage": true,
            "hasNextPage": true,
            "prevPage": 1,
            "nextPage": 3
        }))
        .unwrap();
        assert_eq!(envelope.total_docs, 100);
        assert_eq!(envelope.prev_page, Some(1));
        assert_eq!(envelope.next_page, Some(3));
        assert_eq!(envelope.docs.len(), 1);
    }

    #[test]
    fn null_pages_decode_to_none() {
        let envelope = PageEnvelope::from_document(json!({
            "docs": [],
            "totalDocs": 0,
            "totalPages": 0,
            "page": 1,
            "limit": 10,
            "hasPrevPage": false,
            "hasNextPage": false,
            "prevPage": null,
            "nextPage": null
        }))
        .unwrap();
        assert_eq!(envelope.prev_page, None);
        assert_eq!(envelope.next_page, None);
    }

    #[test]
    fn extra_fields_ignored() {
        let envelope = PageEnvelope::from_document(json!({
            "docs": [],
            "totalDocs": 0,
            "totalPages": 0,
            "page": 1,
            "limit": 10,
            "hasPrevPage": false,
            "hasNextPage": false,
            "prevPage": null,
            "nextPage": null,
            "source": "api"
        }))
        .unwrap();
        assert_eq!(envelope.limit, 10);
    }

    #[test]
    fn non_envelope_document_is_an_error() {
        let err = PageEnvelope::from_document(json!({ "docs": "nope" })).unwrap_err();
        assert!(matches!(err, Error::InvalidEnvelope(_)));
    }
}
