//! List option composition for lookup helpers.

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::params::QueryParams;

/// Option applied to the list commands issued by lookup helpers.
///
/// Helpers take a slice of options and apply them in order, after the
/// client-wide options configured at construction time. Scopes given by
/// name are resolved to IDs through the matching lookup service; empty
/// values are skipped so callers can pass attributes straight through.
#[derive(Debug, Clone)]
pub enum ListOption {
    /// Scope to a project, given by name or ID.
    Project(String),
    /// Scope to a zone, given by name or ID.
    Zone(String),
}

impl CloudStackClient {
    /// Applies the client-wide options followed by `opts` to `params`.
    pub(crate) async fn apply_options(
        &self,
        params: &mut QueryParams,
        opts: &[ListOption],
    ) -> Result<()> {
        let defaults = self.default_options().to_vec();
        for opt in defaults.iter().chain(opts) {
            match opt {
                ListOption::Project(project) if !project.is_empty() => {
                    let id = self.project().resolve_id(project).await?;
                    params.set("projectid", id);
                }
                ListOption::Zone(zone) if !zone.is_empty() => {
                    let id = self.zone().resolve_id(zone).await?;
                    params.set("zoneid", id);
                }
                // Empty scope, nothing to apply.
                _ => {}
            }
        }
        Ok(())
    }
}

/// Builds the option slice for an optional project attribute.
pub fn project_scope(project: Option<String>) -> Vec<ListOption> {
    project.map(ListOption::Project).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_scope_skips_none() {
        assert!(project_scope(None).is_empty());
        let opts = project_scope(Some("web".to_string()));
        assert_eq!(opts.len(), 1);
        assert!(matches!(&opts[0], ListOption::Project(p) if p == "web"));
    }

    // ID-form scopes resolve without touching the server, so these run
    // against a client that never issues a request.
    #[tokio::test]
    async fn client_wide_options_are_applied_first() {
        let cs = CloudStackClient::new("http://localhost:8080/client/api", "key", "secret")
            .with_default_options(vec![ListOption::Project(
                "49f31b80-6213-4086-8fbd-0ee7dbd11ae6".to_string(),
            )]);

        let mut params = QueryParams::new();
        cs.apply_options(&mut params, &[]).await.unwrap();
        assert_eq!(params.get("projectid"), Some("49f31b80-6213-4086-8fbd-0ee7dbd11ae6"));

        // A per-call scope overrides the client-wide one.
        let mut params = QueryParams::new();
        cs.apply_options(
            &mut params,
            &[ListOption::Project("713a5936-8b3e-4f4f-a3f5-4b183ad04f73".to_string())],
        )
        .await
        .unwrap();
        assert_eq!(params.get("projectid"), Some("713a5936-8b3e-4f4f-a3f5-4b183ad04f73"));
    }

    #[tokio::test]
    async fn empty_scopes_are_skipped() {
        let cs = CloudStackClient::new("http://localhost:8080/client/api", "key", "secret");
        let mut params = QueryParams::new();
        cs.apply_options(
            &mut params,
            &[
                ListOption::Project(String::new()),
                ListOption::Zone("badf8b23-3fdd-4c6c-9a6e-1f2f7e4e8a01".to_string()),
            ],
        )
        .await
        .unwrap();
        assert!(!params.contains("projectid"));
        assert_eq!(params.get("zoneid"), Some("badf8b23-3fdd-4c6c-9a6e-1f2f7e4e8a01"));
    }
}
