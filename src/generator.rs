use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::params::SearchClause;

// ---------------------------------------------------------------------------
// Populate spec
// ---------------------------------------------------------------------------

/// One join descriptor: attach documents from another collection whose
/// `foreign_field` equals (or, with `membership`, contains) the owning
/// document's `local_field` value.
///
/// Wire names follow the request format (`ref`, `localField`, `virtualName`,
/// `removeObjectId`, ...); the Rust names describe what the fields do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulateSpec {
    /// Target collection.
    #[serde(rename = "ref")]
    pub from: String,
    #[serde(rename = "localField")]
    pub local_field: String,
    #[serde(rename = "foreignField")]
    pub foreign_field: String,
    /// Output field the joined documents land in.
    #[serde(rename = "virtualName")]
    pub output_field: String,
    /// Full override of the lookup sub-pipeline; when set, everything below
    /// except `unwind`/`preserve` is ignored.
    pub pipeline: Option<Vec<Value>>,
    /// Extra conditions ANDed into the join condition.
    #[serde(rename = "match")]
    pub extra_match: Vec<Value>,
    /// Join on array membership instead of equality.
    #[serde(rename = "in")]
    pub membership: bool,
    /// Extra sub-pipeline stages between the join match and the projection.
    pub facet: Vec<Value>,
    /// Sub-pipeline output shape; defaults to excluding the internal `__v`
    /// version field.
    #[serde(rename = "project")]
    pub projection: Option<Value>,
    /// Flatten the joined array into one document per element.
    pub unwind: bool,
    /// Keep the owning document when the joined array is empty.
    pub preserve: bool,
    /// Use the local field value as-is instead of coercing it to an
    /// identifier with `$toObjectId`.
    #[serde(rename = "removeObjectId")]
    pub raw_local_field: bool,
}

impl PopulateSpec {
    pub fn new(from: &str, local_field: &str, foreign_field: &str, output_field: &str) -> Self {
        PopulateSpec {
            from: from.to_string(),
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            output_field: output_field.to_string(),
            ..PopulateSpec::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination stages
// ---------------------------------------------------------------------------

/// Facet + reshape stages for deterministic pagination: the `docs` branch
/// takes the page slice in upstream order, the `count` branch counts the
/// whole filtered set, and follow-up stages attach the envelope metadata.
/// `extra` stages run after the metadata is attached.
pub fn page_stages(page: i64, limit: i64, extra: &[Value]) -> Vec<Value> {
    let docs_branch = vec![json!({ "$skip": (page - 1) * limit }), json!({ "$limit": limit })];
    assemble_page_stages(page, limit, docs_branch, extra)
}

/// Sampling variant of [`page_stages`]: the `docs` branch draws a random
/// sample of `limit` documents instead of a deterministic slice. Envelope
/// metadata is still computed against the full filtered set.
pub fn page_stages_sample(page: i64, limit: i64, extra: &[Value]) -> Vec<Value> {
    let docs_branch = vec![
        json!({ "$skip": (page - 1) * limit }),
        json!({ "$sample": { "size": limit } }),
    ];
    assemble_page_stages(page, limit, docs_branch, extra)
}

fn assemble_page_stages(page: i64, limit: i64, docs_branch: Vec<Value>, extra: &[Value]) -> Vec<Value> {
    let mut stages = vec![
        json!({
            "$facet": {
                "count": [{ "$count": "status" }],
                "docs": docs_branch,
            }
        }),
        json!({
            "$project": {
                "docs": 1,
                "count": { "$arrayElemAt": ["$count", 0] },
            }
        }),
        // Zero matches leaves the count branch empty; that is zero, not an
        // error.
        json!({
            "$project": {
                "docs": 1,
                "totalDocs": { "$toInt": { "$ifNull": ["$count.status", 0] } },
            }
        }),
        json!({
            "$addFields": {
                "totalPages": { "$ceil": { "$divide": ["$totalDocs", limit] } },
                "page": page,
                "limit": limit,
            }
        }),
        json!({
            "$addFields": {
                "hasPrevPage": { "$cond": [{ "$gt": ["$page", 1] }, true, false] },
                "hasNextPage": { "$cond": [{ "$lt": ["$page", "$totalPages"] }, true, false] },
                "prevPage": { "$cond": [{ "$lte": [page - 1, 0] }, null, page - 1] },
                "nextPage": { "$cond": [{ "$gt": [page + 1, "$totalPages"] }, null, page + 1] },
            }
        }),
    ];
    stages.extend(extra.iter().cloned());
    stages
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Wrap a caller-supplied projection map in a single `$project` stage.
pub fn select_stage(projection: &Map<String, Value>) -> Vec<Value> {
    vec![json!({ "$project": projection })]
}

// ---------------------------------------------------------------------------
// Populate (lookup) stages
// ---------------------------------------------------------------------------

/// One `$lookup` stage per descriptor, each with a correlated sub-pipeline,
/// plus an optional trailing `$unwind`.
pub fn populate_stages(specs: &[PopulateSpec]) -> Vec<Value> {
    let mut stages = Vec::new();
    for spec in specs {
        let local_ref = format!("${}", spec.local_field);
        let let_value = if spec.raw_local_field {
            Value::String(local_ref)
        } else {
            json!({ "$toObjectId": local_ref })
        };

        let sub_pipeline = match &spec.pipeline {
            Some(pipeline) => pipeline.clone(),
            None => {
                let foreign_ref = format!("${}", spec.foreign_field);
                let join_cond = if spec.membership {
                    json!({ "$in": [foreign_ref, "$$value"] })
                } else {
                    json!({ "$eq": [foreign_ref, "$$value"] })
                };
                let mut conditions = vec![join_cond];
                conditions.extend(spec.extra_match.iter().cloned());

                let mut sub = vec![json!({ "$match": { "$expr": { "$and": conditions } } })];
                sub.extend(spec.facet.iter().cloned());
                sub.push(json!({
                    "$project": spec.projection.clone().unwrap_or_else(|| json!({ "__v": 0 }))
                }));
                sub
            }
        };

        stages.push(json!({
            "$lookup": {
                "from": spec.from,
                "let": { "value": let_value },
                "pipeline": sub_pipeline,
                "as": spec.output_field,
            }
        }));

        if spec.unwind {
            let path = format!("${}", spec.output_field);
            stages.push(if spec.preserve {
                json!({ "$unwind": { "path": path, "preserveNullAndEmptyArrays": true } })
            } else {
                json!({ "$unwind": path })
            });
        }
    }
    stages
}

// ---------------------------------------------------------------------------
// Search stages
// ---------------------------------------------------------------------------

/// Build a `$match` requiring at least one clause to hold (OR semantics).
///
/// Clauses whose field is not allow-listed are silently dropped; patterns
/// match as case-insensitive regular expressions. Returns `None` when no
/// clause survives, meaning the stage is omitted entirely.
pub fn search_any_stage(clauses: &[SearchClause], allowed: &[String]) -> Option<Value> {
    let conditions: Vec<Value> = clauses
        .iter()
        .filter(|clause| allowed.iter().any(|field| *field == clause.field))
        .map(|clause| {
            let mut cond = Map::new();
            cond.insert(
                clause.field.clone(),
                json!({ "$regex": clause.pattern, "$options": "i" }),
            );
            Value::Object(cond)
        })
        .collect();
    if conditions.is_empty() {
        None
    } else {
        Some(json!({ "$match": { "$or": conditions } }))
    }
}

/// Build a `$match` requiring every surviving clause to hold simultaneously
/// (AND semantics): one case-insensitive regex condition per field in a
/// single match document. Same allow-list filtering as
/// [`search_any_stage`]; `None` when nothing survives.
pub fn search_all_stage(clauses: &[SearchClause], allowed: &[String]) -> Option<Value> {
    let mut conditions = Map::new();
    for clause in clauses {
        if allowed.iter().any(|field| *field == clause.field) {
            conditions.insert(
                clause.field.clone(),
                json!({ "$regex": clause.pattern, "$options": "i" }),
            );
        }
    }
    if conditions.is_empty() {
        None
    } else {
        Some(json!({ "$match": Value::Object(conditions) }))
    }
}

// ---------------------------------------------------------------------------
// Emptiness predicate
// ---------------------------------------------------------------------------

/// Universal emptiness check used as the gate before appending generated
/// stages: booleans and numbers are never empty, strings/arrays/objects are
/// empty at zero length/keys.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(_) | Value::Number(_) => false,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
