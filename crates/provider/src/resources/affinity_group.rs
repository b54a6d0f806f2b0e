//! Affinity group resource handler for Terraform

use anyhow::Result;
use cloudstack::affinity_group::{
    AffinityGroup, CreateAffinityGroupParams, DeleteAffinityGroupParams,
};
use cloudstack::options::project_scope;
use cloudstack::CloudStackClient;
use tracing::info;

use super::{project_id_for, Resource};
use crate::state::{
    get_optional_string_attr, get_string_attr, make_state, optional_string_value, string_value,
    DynamicValue,
};

pub struct AffinityGroupResource;

#[async_trait::async_trait]
impl Resource for AffinityGroupResource {
    fn type_name() -> &'static str {
        "cloudstack_affinity_group"
    }

    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue> {
        let name = get_string_attr(config, "name");
        let group_type = get_string_attr(config, "type");
        // The API requires a description, so fall back to the name.
        let description = get_optional_string_attr(config, "description")
            .unwrap_or_else(|| name.clone());

        let mut p = CreateAffinityGroupParams::new(&name, &group_type);
        p.set_description(&description);
        let project = get_optional_string_attr(config, "project");
        if let Some(id) = project_id_for(cs, project.as_deref()).await? {
            p.set_projectid(id);
        }

        let group = cs.affinity_group().create(&p).await?;
        info!(id = %group.id, name = %name, "created affinity group");
        group_to_state(&group, project.as_deref())
    }

    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let project = get_optional_string_attr(state, "project");
        let opts = project_scope(project.clone());
        let group = cs.affinity_group().get_by_id(&id, &opts).await?;
        group_to_state(&group, project.as_deref())
    }

    async fn update(
        cs: &CloudStackClient,
        state: &DynamicValue,
        _config: &DynamicValue,
    ) -> Result<DynamicValue> {
        // All attributes are force-new, so an update is only a refresh.
        Self::read(cs, state).await
    }

    async fn delete(cs: &CloudStackClient, state: &DynamicValue) -> Result<()> {
        let id = get_string_attr(state, "id");
        let project = get_optional_string_attr(state, "project");

        let mut p = DeleteAffinityGroupParams::new();
        p.set_id(&id);
        if let Some(pid) = project_id_for(cs, project.as_deref()).await? {
            p.set_projectid(pid);
        }

        match cs.affinity_group().delete(&p).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_entity_gone(&id) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn group_to_state(group: &AffinityGroup, project: Option<&str>) -> Result<DynamicValue> {
    Ok(make_state(vec![
        ("id", string_value(&group.id)),
        ("name", string_value(&group.name)),
        ("description", optional_string_value(&group.description)),
        ("type", string_value(&group.group_type)),
        ("project", optional_string_value(project.unwrap_or_default())),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_group_fields_to_state() {
        let group = AffinityGroup {
            id: "ag-1".to_string(),
            name: "web".to_string(),
            description: "web tier".to_string(),
            group_type: "host anti-affinity".to_string(),
            ..Default::default()
        };
        let state = group_to_state(&group, None).unwrap();
        assert_eq!(state.get("id").unwrap().as_string(), Some("ag-1"));
        assert_eq!(state.get("type").unwrap().as_string(), Some("host anti-affinity"));
        assert!(state.get("project").unwrap().is_null());
    }

    #[test]
    fn keeps_project_from_configuration() {
        let state = group_to_state(&AffinityGroup::default(), Some("web-project")).unwrap();
        assert_eq!(state.get("project").unwrap().as_string(), Some("web-project"));
    }
}
