//! Security group resource handler for Terraform

use anyhow::Result;
use cloudstack::options::project_scope;
use cloudstack::security_group::{
    CreateSecurityGroupParams, DeleteSecurityGroupParams, SecurityGroup,
};
use cloudstack::CloudStackClient;
use tracing::info;

use super::{project_id_for, Resource};
use crate::retry::retry;
use crate::state::{
    get_optional_string_attr, get_string_attr, make_state, optional_string_value, string_value,
    DynamicValue,
};

pub struct SecurityGroupResource;

#[async_trait::async_trait]
impl Resource for SecurityGroupResource {
    fn type_name() -> &'static str {
        "cloudstack_security_group"
    }

    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue> {
        let name = get_string_attr(config, "name");
        let description = get_optional_string_attr(config, "description")
            .unwrap_or_else(|| name.clone());

        let mut p = CreateSecurityGroupParams::new(&name);
        p.set_description(&description);
        let project = get_optional_string_attr(config, "project");
        if let Some(id) = project_id_for(cs, project.as_deref()).await? {
            p.set_projectid(id);
        }

        let group = cs.security_group().create(&p).await?;
        info!(id = %group.id, name = %name, "created security group");
        group_to_state(&group, project.as_deref())
    }

    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let project = get_optional_string_attr(state, "project");
        let opts = project_scope(project.clone());
        let group = cs.security_group().get_by_id(&id, &opts).await?;
        group_to_state(&group, project.as_deref())
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
        let project = get_optional_string_attr(state, "project");

        let mut p = DeleteSecurityGroupParams::new();
        p.set_id(&id);
        if let Some(pid) = project_id_for(cs, project.as_deref()).await? {
            p.set_projectid(pid);
        }

        // Instances detached in the same apply may still hold the group
        // for a moment, so retry the delete.
        match retry(3, || async { cs.security_group().delete(&p).await }).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_entity_gone(&id) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn group_to_state(group: &SecurityGroup, project: Option<&str>) -> Result<DynamicValue> {
    Ok(make_state(vec![
        ("id", string_value(&group.id)),
        ("name", string_value(&group.name)),
        ("description", optional_string_value(&group.description)),
        ("project", optional_string_value(project.unwrap_or_default())),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_group_fields_to_state() {
        let group = SecurityGroup {
            id: "sg-1".to_string(),
            name: "default".to_string(),
            description: "default group".to_string(),
            ..Default::default()
        };
        let state = group_to_state(&group, Some("web")).unwrap();
        assert_eq!(state.get("id").unwrap().as_string(), Some("sg-1"));
        assert_eq!(state.get("description").unwrap().as_string(), Some("default group"));
        assert_eq!(state.get("project").unwrap().as_string(), Some("web"));
    }
}
