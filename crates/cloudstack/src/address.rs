//! Public IP address service. The provider only needs it to find the
//! source NAT address of a VPC.

use serde::Deserialize;

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::params::QueryParams;

pub struct AddressService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn address(&self) -> AddressService<'_> {
        AddressService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PublicIpAddress {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ipaddress: String,
    #[serde(default)]
    pub issourcenat: bool,
    #[serde(default)]
    pub vpcid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListPublicIpAddressesResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "publicipaddress")]
    pub addresses: Vec<PublicIpAddress>,
}

impl<'a> AddressService<'a> {
    pub async fn list_public_ip_addresses(
        &self,
        params: &QueryParams,
    ) -> Result<ListPublicIpAddressesResponse> {
        self.cs.execute("listPublicIpAddresses", params).await
    }

    /// Finds the source NAT address of a VPC, if one is assigned.
    pub async fn source_nat_ip_for_vpc(
        &self,
        vpcid: &str,
        projectid: Option<&str>,
    ) -> Result<Option<String>> {
        let mut q = QueryParams::new();
        q.set("vpcid", vpcid);
        q.set_bool("issourcenat", true);
        if let Some(p) = projectid {
            q.set("projectid", p);
        }
        let mut r = self.list_public_ip_addresses(&q).await?;
        if r.addresses.is_empty() {
            return Ok(None);
        }
        Ok(Some(r.addresses.remove(0).ipaddress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_decodes() {
        let r: ListPublicIpAddressesResponse = serde_json::from_str(
            r#"{"count": 1, "publicipaddress": [
                {"id": "ip-1", "ipaddress": "192.0.2.15", "issourcenat": true, "vpcid": "vpc-1"}
            ]}"#,
        )
        .unwrap();
        assert!(r.addresses[0].issourcenat);
    }
}
