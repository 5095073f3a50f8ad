use std::fs;
use std::path::Path;

use crate::dom::snapshot::is_yaml;
use crate::error::{AutofillError, Result};
use crate::fill::FieldMapping;
use crate::resolver::{ResolveRequest, Resolver};

/// A fixed mapping, returned whole on every call. Entries for ids the
/// session has already handled are ignored by the session.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    mapping: FieldMapping,
}

impl StaticResolver {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    /// Load a mapping from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AutofillError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let context = format!("mapping {}", path.display());
        let mapping: FieldMapping = if is_yaml(path) {
            serde_yaml::from_str(&raw).map_err(|e| AutofillError::Parse {
                context,
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&raw).map_err(|e| AutofillError::Parse {
                context,
                message: e.to_string(),
            })?
        };
        Ok(Self::new(mapping))
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, _request: &ResolveRequest) -> Result<FieldMapping> {
        Ok(self.mapping.clone())
    }
}
