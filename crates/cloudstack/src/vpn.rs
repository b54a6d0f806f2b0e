//! Site-to-site VPN gateway service.

use serde::Deserialize;

use crate::client::{CloudStackClient, SuccessResponse};
use crate::error::{Error, Result};
use crate::lookup::pick_by_id;
use crate::params::QueryParams;

pub struct VpnService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn vpn(&self) -> VpnService<'_> {
        VpnService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct VpnGateway {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub publicip: String,
    #[serde(default)]
    pub vpcid: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub domainid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListVpnGatewaysResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "vpngateway")]
    pub vpn_gateways: Vec<VpnGateway>,
}

impl<'a> VpnService<'a> {
    /// Creates a VPN gateway for a VPC.
    pub async fn create_gateway(&self, vpcid: &str) -> Result<VpnGateway> {
        let mut q = QueryParams::new();
        q.set("vpcid", vpcid);
        self.cs.execute_async("createVpnGateway", &q).await
    }

    /// Deletes a VPN gateway by ID.
    pub async fn delete_gateway(&self, id: &str) -> Result<SuccessResponse> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.execute_async("deleteVpnGateway", &q).await
    }

    pub async fn list_gateways(&self, params: &QueryParams) -> Result<ListVpnGatewaysResponse> {
        self.cs.execute("listVpnGateways", params).await
    }

    /// Fetches a VPN gateway by ID.
    pub async fn get_gateway_by_id(&self, id: &str) -> Result<VpnGateway> {
        let mut q = QueryParams::new();
        q.set("id", id);
        let r = match self.list_gateways(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => {
                return Err(Error::NotFound(format!("VPN gateway {id}")))
            }
            Err(e) => return Err(e),
        };
        pick_by_id(r.vpn_gateways, id, "VPN gateway")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_decodes() {
        let r: ListVpnGatewaysResponse = serde_json::from_str(
            r#"{"count": 1, "vpngateway": [
                {"id": "gw-1", "publicip": "192.0.2.10", "vpcid": "vpc-1"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(r.vpn_gateways[0].publicip, "192.0.2.10");
    }
}
