//! Security group service. These commands complete synchronously.

use serde::Deserialize;

use crate::client::{CloudStackClient, SuccessResponse};
use crate::error::{Error, Result};
use crate::lookup::{pick_by_id, pick_by_name};
use crate::options::ListOption;
use crate::params::QueryParams;

pub struct SecurityGroupService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn security_group(&self) -> SecurityGroupService<'_> {
        SecurityGroupService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SecurityGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub domainid: String,
    #[serde(default)]
    pub projectid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListSecurityGroupsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "securitygroup")]
    pub security_groups: Vec<SecurityGroup>,
}

/// Parameters for `createSecurityGroup`.
#[derive(Debug, Clone)]
pub struct CreateSecurityGroupParams {
    name: String,
    description: Option<String>,
    projectid: Option<String>,
}

impl CreateSecurityGroupParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
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
        if let Some(v) = &self.description {
            q.set("description", v);
        }
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

/// Parameters for `deleteSecurityGroup`.
#[derive(Debug, Default, Clone)]
pub struct DeleteSecurityGroupParams {
    id: Option<String>,
    name: Option<String>,
    projectid: Option<String>,
}

impl DeleteSecurityGroupParams {
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

impl<'a> SecurityGroupService<'a> {
    /// Creates a security group. The payload nests the group one level
    /// deeper than the envelope.
    pub async fn create(&self, p: &CreateSecurityGroupParams) -> Result<SecurityGroup> {
        self.cs
            .execute_nested("createSecurityGroup", &p.to_query())
            .await
    }

    /// Deletes a security group.
    pub async fn delete(&self, p: &DeleteSecurityGroupParams) -> Result<SuccessResponse> {
        self.cs.execute("deleteSecurityGroup", &p.to_query()).await
    }

    pub async fn list(&self, params: &QueryParams) -> Result<ListSecurityGroupsResponse> {
        self.cs.execute("listSecurityGroups", params).await
    }

    /// Fetches a security group by ID, applying the given list options.
    pub async fn get_by_id(&self, id: &str, opts: &[ListOption]) -> Result<SecurityGroup> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.apply_options(&mut q, opts).await?;
        let r = match self.list(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => {
                return Err(Error::NotFound(format!("security group {id}")))
            }
            Err(e) => return Err(e),
        };
        pick_by_id(r.security_groups, id, "security group")
    }

    /// Fetches a security group by name, applying the given list options.
    pub async fn get_by_name(&self, name: &str, opts: &[ListOption]) -> Result<SecurityGroup> {
        let mut q = QueryParams::new();
        q.set("securitygroupname", name);
        self.cs.apply_options(&mut q, opts).await?;
        let r = self.list(&q).await?;
        pick_by_name(r.security_groups, name, |g| &g.name, "security group")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_params_marshal() {
        let mut p = CreateSecurityGroupParams::new("web");
        p.set_description("terraform-security-group-text");
        p.set_projectid("p-1");
        let q = p.to_query();
        assert_eq!(q.get("name"), Some("web"));
        assert_eq!(q.get("description"), Some("terraform-security-group-text"));
        assert_eq!(q.get("projectid"), Some("p-1"));
    }

    #[test]
    fn list_response_decodes() {
        let r: ListSecurityGroupsResponse = serde_json::from_str(
            r#"{"count": 2, "securitygroup": [
                {"id": "sg-1", "name": "web"},
                {"id": "sg-2", "name": "web-2"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(r.security_groups.len(), 2);
    }
}
