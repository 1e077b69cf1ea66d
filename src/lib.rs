pub mod envelope;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod orchestrator;
pub mod params;

pub use envelope::PageEnvelope;
pub use error::{Error, Result};
pub use generator::PopulateSpec;
pub use helpers::HelperConfig;
pub use orchestrator::{
    build_pipeline, execute, AggregateOptions, AggregationTarget, Introspection, ListRequest,
    Outcome,
};
pub use params::{ListParams, SortOrder};
