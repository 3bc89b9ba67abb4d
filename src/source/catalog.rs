//! The Pipedrive resource catalog
//!
//! Resources are plain data. The engine decides how to run them; a
//! dependent resource names its parent instead of piping into it.

use super::fanout::SubResource;
use crate::error::{Error, Result};
use crate::types::{StringMap, WriteDisposition};
use std::collections::HashSet;

/// Entities served by a plain paginated GET, in emission order
pub const SIMPLE_ENDPOINTS: [&str; 11] = [
    "persons",
    "stages",
    "productFields",
    "products",
    "pipelines",
    "personFields",
    "users",
    "organizations",
    "organizationFields",
    "activityFields",
    "dealFields",
];

/// How the records of a resource are obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// Paginated GET of `{base}/{entity}`
    Endpoint {
        /// Entity path under the API base
        entity: String,
        /// Filters sent with every page request
        extra_params: StringMap,
    },
    /// One paginated GET per record of another resource
    Dependent {
        /// Name of the parent resource
        parent: String,
        /// Collection fetched per parent record
        sub_resource: SubResource,
    },
}

/// A named stream the source can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    /// Stream name
    pub name: String,
    /// How destinations treat earlier runs
    pub write_disposition: WriteDisposition,
    /// How records are fetched
    pub kind: ResourceKind,
}

impl ResourceDef {
    /// A top-level endpoint whose stream name is the entity
    pub fn endpoint(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            name: entity.clone(),
            write_disposition: WriteDisposition::Replace,
            kind: ResourceKind::Endpoint {
                entity,
                extra_params: StringMap::new(),
            },
        }
    }

    /// A resource fetched once per record of `parent`
    pub fn dependent(
        name: impl Into<String>,
        parent: impl Into<String>,
        sub_resource: SubResource,
    ) -> Self {
        Self {
            name: name.into(),
            write_disposition: WriteDisposition::Replace,
            kind: ResourceKind::Dependent {
                parent: parent.into(),
                sub_resource,
            },
        }
    }

    /// Add a filter parameter (endpoints only)
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let ResourceKind::Endpoint { extra_params, .. } = &mut self.kind {
            extra_params.insert(key.into(), value.into());
        }
        self
    }

    /// Set the write disposition
    #[must_use]
    pub fn with_write_disposition(mut self, disposition: WriteDisposition) -> Self {
        self.write_disposition = disposition;
        self
    }

    /// Parent resource name, for dependent resources
    pub fn parent(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::Dependent { parent, .. } => Some(parent),
            ResourceKind::Endpoint { .. } => None,
        }
    }

    /// Whether this resource is fetched per parent record
    pub fn is_dependent(&self) -> bool {
        self.parent().is_some()
    }
}

/// Every stream of the Pipedrive source
///
/// Simple endpoints, then activities for all users (`user_id=0`), then
/// deals with the two resources fanned out from it.
pub fn pipedrive_source() -> Vec<ResourceDef> {
    let mut resources: Vec<ResourceDef> = SIMPLE_ENDPOINTS
        .iter()
        .map(|entity| ResourceDef::endpoint(*entity))
        .collect();

    resources.push(ResourceDef::endpoint("activities").with_param("user_id", "0"));
    resources.push(ResourceDef::endpoint("deals"));
    resources.push(ResourceDef::dependent(
        "deals_participants",
        "deals",
        SubResource::new("deals", "participants"),
    ));
    resources.push(ResourceDef::dependent(
        "deals_flow",
        "deals",
        SubResource::new("deals", "flow"),
    ));

    resources
}

/// Check names are unique and every dependent has a top-level parent
pub fn validate_catalog(resources: &[ResourceDef]) -> Result<()> {
    let mut names = HashSet::new();
    for resource in resources {
        if !names.insert(resource.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate resource name: {}",
                resource.name
            )));
        }
    }

    for resource in resources {
        if let Some(parent) = resource.parent() {
            let parent_def = resources.iter().find(|r| r.name == parent);
            match parent_def {
                Some(p) if !p.is_dependent() => {}
                Some(_) => {
                    return Err(Error::config(format!(
                        "Resource '{}' depends on '{parent}', which is itself dependent",
                        resource.name
                    )))
                }
                None => {
                    return Err(Error::config(format!(
                        "Resource '{}' depends on unknown resource '{parent}'",
                        resource.name
                    )))
                }
            }
        }
    }

    Ok(())
}

/// Check every selected name exists in the catalog
pub fn validate_selection(resources: &[ResourceDef], selection: &[String]) -> Result<()> {
    for name in selection {
        if !resources.iter().any(|r| &r.name == name) {
            return Err(Error::stream_not_found(name.clone()));
        }
    }
    Ok(())
}
