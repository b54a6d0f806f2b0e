//! Resource Implementations
//!
//! Implements the CRUD operations for each resource type. Each module
//! maps Terraform attribute values onto CloudStack API calls through the
//! shared client handle.

pub mod affinity_group;
pub mod network_acl;
pub mod security_group;
pub mod ssh_keypair;
pub mod static_route;
pub mod vpc;
pub mod vpn_gateway;

use anyhow::Result;
use cloudstack::CloudStackClient;

use crate::state::DynamicValue;

/// Trait for resource operations
#[async_trait::async_trait]
pub trait Resource {
    /// Resource type name
    fn type_name() -> &'static str;

    /// Create a new resource
    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue>;

    /// Read an existing resource. Returns a `cloudstack` not-found error
    /// when the server reports zero matches, which clears the state.
    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue>;

    /// Update an existing resource. Resources whose attributes are all
    /// force-new never see a real change here and simply re-read.
    async fn update(
        cs: &CloudStackClient,
        state: &DynamicValue,
        config: &DynamicValue,
    ) -> Result<DynamicValue>;

    /// Delete a resource. An already-deleted object counts as success.
    async fn delete(cs: &CloudStackClient, state: &DynamicValue) -> Result<()>;
}

/// Resolves an optional project attribute to a project ID.
pub(crate) async fn project_id_for(
    cs: &CloudStackClient,
    project: Option<&str>,
) -> cloudstack::Result<Option<String>> {
    match project {
        Some(p) if !p.is_empty() => Ok(Some(cs.project().resolve_id(p).await?)),
        _ => Ok(None),
    }
}
