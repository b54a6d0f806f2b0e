//! Network ACL list service.

use serde::Deserialize;

use crate::client::{CloudStackClient, SuccessResponse};
use crate::error::{Error, Result};
use crate::lookup::pick_by_id;
use crate::options::ListOption;
use crate::params::QueryParams;

pub struct NetworkAclService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn network_acl(&self) -> NetworkAclService<'_> {
        NetworkAclService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NetworkAclList {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vpcid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListNetworkAclListsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "networkacllist")]
    pub acl_lists: Vec<NetworkAclList>,
}

/// Parameters for `createNetworkACLList`.
#[derive(Debug, Clone)]
pub struct CreateNetworkAclListParams {
    name: String,
    vpcid: String,
    description: Option<String>,
}

impl CreateNetworkAclListParams {
    pub fn new(name: impl Into<String>, vpcid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vpcid: vpcid.into(),
            description: None,
        }
    }

    pub fn set_description(&mut self, v: impl Into<String>) {
        self.description = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("name", &self.name);
        q.set("vpcid", &self.vpcid);
        if let Some(v) = &self.description {
            q.set("description", v);
        }
        q
    }
}

impl<'a> NetworkAclService<'a> {
    /// Creates a network ACL list attached to a VPC.
    pub async fn create_list(&self, p: &CreateNetworkAclListParams) -> Result<NetworkAclList> {
        self.cs
            .execute_async("createNetworkACLList", &p.to_query())
            .await
    }

    /// Deletes a network ACL list by ID.
    pub async fn delete_list(&self, id: &str) -> Result<SuccessResponse> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.execute_async("deleteNetworkACLList", &q).await
    }

    pub async fn list_lists(&self, params: &QueryParams) -> Result<ListNetworkAclListsResponse> {
        self.cs.execute("listNetworkACLLists", params).await
    }

    /// Fetches an ACL list by ID, applying the given list options.
    pub async fn get_list_by_id(&self, id: &str, opts: &[ListOption]) -> Result<NetworkAclList> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.apply_options(&mut q, opts).await?;
        let r = match self.list_lists(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => {
                return Err(Error::NotFound(format!("network ACL list {id}")))
            }
            Err(e) => return Err(e),
        };
        pick_by_id(r.acl_lists, id, "network ACL list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_params_marshal() {
        let mut p = CreateNetworkAclListParams::new("acl", "vpc-1");
        p.set_description("terraform-acl-text");
        let q = p.to_query();
        assert_eq!(q.get("name"), Some("acl"));
        assert_eq!(q.get("vpcid"), Some("vpc-1"));
        assert_eq!(q.get("description"), Some("terraform-acl-text"));
    }

    #[test]
    fn list_response_decodes() {
        let r: ListNetworkAclListsResponse = serde_json::from_str(
            r#"{"count": 1, "networkacllist": [{"id": "acl-1", "name": "acl", "vpcid": "vpc-1"}]}"#,
        )
        .unwrap();
        assert_eq!(r.acl_lists[0].vpcid, "vpc-1");
    }
}
