use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::generator;
use crate::helpers::HelperConfig;
use crate::params::{self, ListParams, SearchClause};

// ---------------------------------------------------------------------------
// Execution seam
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    pub allow_disk_use: bool,
}

/// The opaque aggregation engine a pipeline runs against. Implementations
/// own transport, timeouts and retries; this layer issues exactly one
/// `aggregate` call per request and propagates failures verbatim.
pub trait AggregationTarget {
    /// Name of the collection the pipeline runs against.
    fn collection(&self) -> &str;

    /// Execute the pipeline atomically and return the result documents.
    fn aggregate(&self, pipeline: &[Value], options: &AggregateOptions) -> Result<Vec<Value>>;
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub helpers: HelperConfig,
    pub params: ListParams,
}

/// What was (or would have been) issued: the exact pipeline plus the inputs
/// that produced it. Returned instead of the shaped result when the request
/// carries `_qr`.
#[derive(Debug, Clone, Serialize)]
pub struct Introspection {
    pub pipeline: Vec<Value>,
    pub helpers: HelperConfig,
    pub params: ListParams,
    pub collection: String,
}

#[derive(Debug)]
pub enum Outcome {
    /// Accumulated stage list, never executed (`pipeline_only`).
    Pipeline(Vec<Value>),
    /// Introspection envelope (`_qr`), never executed.
    Introspection(Introspection),
    /// First document of the aggregation result; Null when the result set
    /// is empty.
    Document(Value),
}

// ---------------------------------------------------------------------------
// Pipeline assembly
// ---------------------------------------------------------------------------

/// Append helper-driven stages to `base` in the fixed dispatch order:
/// add_query, add_fields, group, populate, select, search_all, search_any,
/// sort, page, page_sample. Later fragments depend on the shape produced by
/// earlier ones, so the order is part of the contract.
pub fn build_pipeline(request: &ListRequest, base: Vec<Value>) -> Result<Vec<Value>> {
    let helpers = &request.helpers;
    let params = &request.params;
    let mut pipeline = base;

    for stages in [&helpers.add_query, &helpers.add_fields, &helpers.group] {
        pipeline.extend(stages.iter().cloned());
    }

    if !helpers.populate.is_empty() {
        pipeline.extend(generator::populate_stages(&helpers.populate));
    }

    if !helpers.select.is_empty() {
        pipeline.extend(generator::select_stage(&helpers.select));
    }

    if let Some(allowed) = &helpers.search_all {
        if let Some(stage) = search_stage(params, allowed, generator::search_all_stage)? {
            pipeline.push(stage);
        }
    }
    if let Some(allowed) = &helpers.search_any {
        if let Some(stage) = search_stage(params, allowed, generator::search_any_stage)? {
            pipeline.push(stage);
        }
    }

    if let Some(defaults) = &helpers.sort {
        let sort = merged_sort(defaults, params.sort.as_deref())?;
        if !sort.is_empty() {
            pipeline.push(json!({ "$sort": sort }));
        }
    }

    if let Some(extra) = &helpers.page {
        let page = params::normalize_page(params.page);
        let limit = params::normalize_limit(params.limit);
        pipeline.extend(generator::page_stages(page, limit, extra));
    }
    if let Some(extra) = &helpers.page_sample {
        let page = params::normalize_page(params.page);
        let limit = params::normalize_limit(params.limit);
        pipeline.extend(generator::page_stages_sample(page, limit, extra));
    }

    Ok(pipeline)
}

fn search_stage(
    params: &ListParams,
    allowed: &[String],
    build: fn(&[SearchClause], &[String]) -> Option<Value>,
) -> Result<Option<Value>> {
    match params.search.as_deref() {
        Some(raw) if !raw.is_empty() => {
            let clauses = params::parse_search_clauses(raw)?;
            Ok(build(&clauses, allowed))
        }
        _ => Ok(None),
    }
}

/// Merge the helper's default sort (lower precedence) with the request sort
/// string (higher precedence). A request clause for an existing key
/// overwrites it in place; new keys are appended after the defaults.
fn merged_sort(defaults: &Map<String, Value>, requested: Option<&str>) -> Result<Map<String, Value>> {
    let mut sort = defaults.clone();
    if let Some(raw) = requested {
        if !raw.is_empty() {
            for (field, order) in params::parse_sort_clauses(raw)? {
                sort.insert(field, Value::from(order.as_i64()));
            }
        }
    }
    Ok(sort)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Assemble the pipeline and run it against `target`, unless the request
/// asks for the raw stage list (`pipeline_only`) or the introspection
/// envelope (`_qr`) — neither of those ever touches the target.
pub fn execute<T: AggregationTarget>(
    target: &T,
    request: &ListRequest,
    base: Vec<Value>,
    options: &AggregateOptions,
) -> Result<Outcome> {
    let pipeline = build_pipeline(request, base)?;

    if request.helpers.pipeline_only {
        return Ok(Outcome::Pipeline(pipeline));
    }
    if request.params.introspect {
        return Ok(Outcome::Introspection(Introspection {
            collection: target.collection().to_string(),
            helpers: request.helpers.clone(),
            params: request.params.clone(),
            pipeline,
        }));
    }

    let mut results = target.aggregate(&pipeline, options)?;
    let doc = if results.is_empty() {
        Value::Null
    } else {
        results.swap_remove(0)
    };
    Ok(Outcome::Document(doc))
}
