//! Project service, mainly for resolving project names to IDs.

use serde::Deserialize;

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::lookup::{is_id, pick_by_name};
use crate::params::QueryParams;

pub struct ProjectService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn project(&self) -> ProjectService<'_> {
        ProjectService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListProjectsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "project")]
    pub projects: Vec<Project>,
}

impl<'a> ProjectService<'a> {
    pub async fn list(&self, params: &QueryParams) -> Result<ListProjectsResponse> {
        self.cs.execute("listProjects", params).await
    }

    /// Resolves a project given by name or ID to its ID.
    pub async fn resolve_id(&self, project: &str) -> Result<String> {
        if is_id(project) {
            return Ok(project.to_string());
        }
        let mut q = QueryParams::new();
        q.set("name", project);
        let r = self.list(&q).await?;
        pick_by_name(r.projects, project, |p| &p.name, "project").map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_decodes() {
        let r: ListProjectsResponse = serde_json::from_str(
            r#"{"count": 1, "project": [{"id": "p-1", "name": "web"}]}"#,
        )
        .unwrap();
        assert_eq!(r.projects[0].id, "p-1");
    }
}
