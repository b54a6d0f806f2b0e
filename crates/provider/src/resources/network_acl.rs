//! Network ACL list resource handler for Terraform

use anyhow::Result;
use cloudstack::network_acl::{CreateNetworkAclListParams, NetworkAclList};
use cloudstack::options::project_scope;
use cloudstack::CloudStackClient;
use tracing::info;

use super::Resource;
use crate::retry::retry;
use crate::state::{
    get_optional_string_attr, get_string_attr, make_state, optional_string_value, string_value,
    DynamicValue,
};

pub struct NetworkAclResource;

#[async_trait::async_trait]
impl Resource for NetworkAclResource {
    fn type_name() -> &'static str {
        "cloudstack_network_acl"
    }

    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue> {
        let name = get_string_attr(config, "name");
        let vpc_id = get_string_attr(config, "vpc_id");
        let description = get_optional_string_attr(config, "description")
            .unwrap_or_else(|| name.clone());

        let mut p = CreateNetworkAclListParams::new(&name, &vpc_id);
        p.set_description(&description);

        let acl = cs.network_acl().create_list(&p).await?;
        info!(id = %acl.id, name = %name, "created network ACL list");
        let project = get_optional_string_attr(config, "project");
        acl_to_state(&acl, project.as_deref())
    }

    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let project = get_optional_string_attr(state, "project");
        let opts = project_scope(project.clone());
        let acl = cs.network_acl().get_list_by_id(&id, &opts).await?;
        acl_to_state(&acl, project.as_deref())
    }

    async fn update(
        cs: &CloudStackClient,
        state: &DynamicValue,
        _config: &DynamicValue,
    ) -> Result<DynamicValue> {
        Self::read(cs, state).await
    }

    async fn delete(cs: &CloudStackClient, state: &DynamicValue) -> Result<()> {
        let id = get_string_attr(state, "id");
        // Deleting an ACL that rules were just removed from can fail while
        // the server finishes cleanup, so retry a few times.
        match retry(3, || async { cs.network_acl().delete_list(&id).await }).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_entity_gone(&id) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn acl_to_state(acl: &NetworkAclList, project: Option<&str>) -> Result<DynamicValue> {
    Ok(make_state(vec![
        ("id", string_value(&acl.id)),
        ("name", string_value(&acl.name)),
        ("description", optional_string_value(&acl.description)),
        ("project", optional_string_value(project.unwrap_or_default())),
        ("vpc_id", string_value(&acl.vpcid)),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_acl_fields_to_state() {
        let acl = NetworkAclList {
            id: "acl-1".to_string(),
            name: "private".to_string(),
            description: "private tier".to_string(),
            vpcid: "vpc-1".to_string(),
        };
        let state = acl_to_state(&acl, None).unwrap();
        assert_eq!(state.get("id").unwrap().as_string(), Some("acl-1"));
        assert_eq!(state.get("vpc_id").unwrap().as_string(), Some("vpc-1"));
        assert!(state.get("project").unwrap().is_null());
    }
}
