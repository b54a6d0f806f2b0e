//! Zone service, mainly for resolving zone names to IDs.

use serde::Deserialize;

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::lookup::{is_id, pick_by_name};
use crate::params::QueryParams;

pub struct ZoneService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn zone(&self) -> ZoneService<'_> {
        ZoneService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub networktype: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListZonesResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "zone")]
    pub zones: Vec<Zone>,
}

impl<'a> ZoneService<'a> {
    pub async fn list(&self, params: &QueryParams) -> Result<ListZonesResponse> {
        self.cs.execute("listZones", params).await
    }

    /// Resolves a zone given by name or ID to its ID.
    pub async fn resolve_id(&self, zone: &str) -> Result<String> {
        if is_id(zone) {
            return Ok(zone.to_string());
        }
        let mut q = QueryParams::new();
        q.set("name", zone);
        let r = self.list(&q).await?;
        pick_by_name(r.zones, zone, |z| &z.name, "zone").map(|z| z.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_decodes() {
        let r: ListZonesResponse = serde_json::from_str(
            r#"{"count": 1, "zone": [{"id": "z-1", "name": "Sandbox-simulator"}]}"#,
        )
        .unwrap();
        assert_eq!(r.zones[0].name, "Sandbox-simulator");
    }
}
