pub mod http;
pub mod static_resolver;

use serde::Serialize;

use crate::error::Result;
use crate::fill::FieldMapping;
use crate::scan::{ActionDescriptor, FieldDescriptor, JobContext};

pub use http::{HttpResolver, ResolverConfig};
pub use static_resolver::StaticResolver;

/// Everything a resolver sees about the page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveRequest {
    pub fields: Vec<FieldDescriptor>,
    pub actions: Vec<ActionDescriptor>,
    pub job: JobContext,
}

/// Maps scanned fields to values or semantic tags.
///
/// Called once for the initial scan and again for each batch of fields
/// revealed by a rescan, with only the new descriptors.
pub trait Resolver {
    fn resolve(&self, request: &ResolveRequest) -> Result<FieldMapping>;
}
