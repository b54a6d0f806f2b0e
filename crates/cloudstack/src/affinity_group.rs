//! Affinity group service.

use serde::Deserialize;

use crate::client::{CloudStackClient, SuccessResponse};
use crate::error::{Error, Result};
use crate::lookup::{pick_by_id, pick_by_name};
use crate::options::ListOption;
use crate::params::QueryParams;

pub struct AffinityGroupService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn affinity_group(&self) -> AffinityGroupService<'_> {
        AffinityGroupService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AffinityGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub group_type: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub domainid: String,
    #[serde(default)]
    pub projectid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListAffinityGroupsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "affinitygroup")]
    pub affinity_groups: Vec<AffinityGroup>,
}

/// Parameters for `createAffinityGroup`.
#[derive(Debug, Clone)]
pub struct CreateAffinityGroupParams {
    name: String,
    group_type: String,
    description: Option<String>,
    projectid: Option<String>,
}

impl CreateAffinityGroupParams {
    pub fn new(name: impl Into<String>, group_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group_type: group_type.into(),
            description: None,
            projectid: None,
        }
    }

    pub fn set_description(&mut self, v: impl Into<String>) {
        self.description = Some(v.into());
    }

    pub fn set_projectid(&mut self, v: impl Into<String>) {
        self.projectid = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("name", &self.name);
        q.set("type", &self.group_type);
        if let Some(v) = &self.description {
            q.set("description", v);
        }
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

/// Parameters for `deleteAffinityGroup`.
#[derive(Debug, Default, Clone)]
pub struct DeleteAffinityGroupParams {
    id: Option<String>,
    name: Option<String>,
    projectid: Option<String>,
}

impl DeleteAffinityGroupParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, v: impl Into<String>) {
        self.id = Some(v.into());
    }

    pub fn set_name(&mut self, v: impl Into<String>) {
        self.name = Some(v.into());
    }

    pub fn set_projectid(&mut self, v: impl Into<String>) {
        self.projectid = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        if let Some(v) = &self.id {
            q.set("id", v);
        }
        if let Some(v) = &self.name {
            q.set("name", v);
        }
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

impl<'a> AffinityGroupService<'a> {
    /// Creates an affinity group.
    pub async fn create(&self, p: &CreateAffinityGroupParams) -> Result<AffinityGroup> {
        self.cs
            .execute_async("createAffinityGroup", &p.to_query())
            .await
    }

    /// Deletes an affinity group.
    pub async fn delete(&self, p: &DeleteAffinityGroupParams) -> Result<SuccessResponse> {
        self.cs
            .execute_async("deleteAffinityGroup", &p.to_query())
            .await
    }

    pub async fn list(&self, params: &QueryParams) -> Result<ListAffinityGroupsResponse> {
        self.cs.execute("listAffinityGroups", params).await
    }

    /// Fetches an affinity group by ID, applying the given list options.
    pub async fn get_by_id(&self, id: &str, opts: &[ListOption]) -> Result<AffinityGroup> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.apply_options(&mut q, opts).await?;
        let r = match self.list(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => {
                return Err(Error::NotFound(format!("affinity group {id}")))
            }
            Err(e) => return Err(e),
        };
        pick_by_id(r.affinity_groups, id, "affinity group")
    }

    /// Fetches an affinity group by name, applying the given list options.
    pub async fn get_by_name(&self, name: &str, opts: &[ListOption]) -> Result<AffinityGroup> {
        let mut q = QueryParams::new();
        q.set("name", name);
        self.cs.apply_options(&mut q, opts).await?;
        let r = self.list(&q).await?;
        pick_by_name(r.affinity_groups, name, |g| &g.name, "affinity group")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_params_marshal() {
        let mut p = CreateAffinityGroupParams::new("web", "host anti-affinity");
        p.set_description("web tier");
        let q = p.to_query();
        assert_eq!(q.get("name"), Some("web"));
        assert_eq!(q.get("type"), Some("host anti-affinity"));
        assert_eq!(q.get("description"), Some("web tier"));
        assert!(!q.contains("projectid"));
    }

    #[test]
    fn delete_params_marshal() {
        let mut p = DeleteAffinityGroupParams::new();
        p.set_id("ag-1");
        let q = p.to_query();
        assert_eq!(q.get("id"), Some("ag-1"));
        assert!(!q.contains("name"));
    }

    #[test]
    fn list_response_decodes() {
        let r: ListAffinityGroupsResponse = serde_json::from_str(
            r#"{"count": 1, "affinitygroup": [
                {"id": "ag-1", "name": "web", "type": "host anti-affinity"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(r.count, 1);
        assert_eq!(r.affinity_groups[0].group_type, "host anti-affinity");
    }
}
