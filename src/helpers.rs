use serde::Serialize;
use serde_json::{Map, Value};

use crate::generator::PopulateSpec;

/// Declarative configuration driving pipeline assembly.
///
/// Each field corresponds to one helper; an empty or unset field is a
/// no-op. Dispatch order is fixed by the orchestrator, not by construction
/// order. `search_any` carries OR semantics (wire key `Search`),
/// `search_all` AND semantics (wire key `SearchAll`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct HelperConfig {
    /// Stages appended verbatim, before anything generated.
    pub add_query: Vec<Value>,
    pub add_fields: Vec<Value>,
    pub group: Vec<Value>,
    pub populate: Vec<PopulateSpec>,
    /// Projection map for a `$project` stage.
    pub select: Map<String, Value>,
    /// Field allow-list; `Some` enables AND search over `ListParams::search`.
    pub search_all: Option<Vec<String>>,
    /// Field allow-list; `Some` enables OR search over `ListParams::search`.
    pub search_any: Option<Vec<String>>,
    /// Default sort map; `Some` enables sorting, request clauses override
    /// same-named keys.
    pub sort: Option<Map<String, Value>>,
    /// Extra post-metadata stages; `Some` enables deterministic pagination.
    pub page: Option<Vec<Value>>,
    /// Extra post-metadata stages; `Some` enables sampled pagination.
    pub page_sample: Option<Vec<Value>>,
    /// Return the accumulated stage list without ever executing it.
    #[serde(rename = "pipeline")]
    pub pipeline_only: bool,
}

impl HelperConfig {
    pub fn new() -> Self {
        HelperConfig::default()
    }

    pub fn add_query(mut self, stages: Vec<Value>) -> Self {
        self.add_query = stages;
        self
    }

    pub fn add_fields(mut self, stages: Vec<Value>) -> Self {
        self.add_fields = stages;
        self
    }

    pub fn group(mut self, stages: Vec<Value>) -> Self {
        self.group = stages;
        self
    }

    pub fn populate(mut self, specs: Vec<PopulateSpec>) -> Self {
        self.populate = specs;
        self
    }

    /// Set the output projection. Anything but a JSON object is ignored.
    pub fn select(mut self, projection: Value) -> Self {
        if let Value::Object(map) = projection {
            self.select = map;
        }
        self
    }

    pub fn search_all(mut self, fields: &[&str]) -> Self {
        self.search_all = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn search_any(mut self, fields: &[&str]) -> Self {
        self.search_any = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Enable sorting with the given defaults. Anything but a JSON object
    /// enables sorting with no defaults (request clauses only).
    pub fn sort(mut self, defaults: Value) -> Self {
        self.sort = match defaults {
            Value::Object(map) => Some(map),
            _ => Some(Map::new()),
        };
        self
    }

    pub fn paginate(mut self) -> Self {
        self.page = Some(Vec::new());
        self
    }

    pub fn paginate_with(mut self, extra: Vec<Value>) -> Self {
        self.page = Some(extra);
        self
    }

    pub fn paginate_sample(mut self) -> Self {
        self.page_sample = Some(Vec::new());
        self
    }

    pub fn paginate_sample_with(mut self, extra: Vec<Value>) -> Self {
        self.page_sample = Some(extra);
        self
    }

    pub fn pipeline_only(mut self) -> Self {
        self.pipeline_only = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_fields() {
        let config = HelperConfig::new()
            .add_fields(vec![json!({ "$addFields": { "a": 1 } })])
            .select(json!({ "title": 1 }))
            .search_any(&["name", "gender"])
            .sort(json!({ "createdAt": -1 }))
            .paginate()
            .pipeline_only();

        assert_eq!(config.add_fields.len(), 1);
        assert_eq!(config.select.get("title"), Some(&json!(1)));
        assert_eq!(config.search_any.as_deref().unwrap().len(), 2);
        assert_eq!(config.sort.as_ref().unwrap().get("createdAt"), Some(&json!(-1)));
        assert_eq!(config.page, Some(Vec::new()));
        assert!(config.page_sample.is_none());
        assert!(config.pipeline_only);
    }

    #[test]
    fn non_object_select_is_a_no_op() {
        let config = HelperConfig::new().select(json!(true));
        assert!(config.select.is_empty());
    }

    #[test]
    fn non_object_sort_still_enables_sorting() {
        let config = HelperConfig::new().sort(json!(true));
        assert_eq!(config.sort, Some(Map::new()));
    }
}
