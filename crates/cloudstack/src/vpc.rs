//! VPC service: VPCs, VPC offerings, and static routes.

use serde::Deserialize;

use crate::client::{CloudStackClient, SuccessResponse};
use crate::error::{Error, Result};
use crate::lookup::{is_id, pick_by_id, pick_by_name};
use crate::options::ListOption;
use crate::params::QueryParams;

pub struct VpcService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn vpc(&self) -> VpcService<'_> {
        VpcService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Vpc {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub networkdomain: String,
    #[serde(default)]
    pub vpcofferingid: String,
    #[serde(default)]
    pub zoneid: String,
    #[serde(default)]
    pub zonename: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub projectid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListVpcsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "vpc")]
    pub vpcs: Vec<Vpc>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct VpcOffering {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListVpcOfferingsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "vpcoffering")]
    pub offerings: Vec<VpcOffering>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StaticRoute {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub gatewayid: String,
    #[serde(default)]
    pub vpcid: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListStaticRoutesResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "staticroute")]
    pub static_routes: Vec<StaticRoute>,
}

/// Parameters for `createVPC`.
#[derive(Debug, Clone)]
pub struct CreateVpcParams {
    name: String,
    displaytext: String,
    cidr: String,
    vpcofferingid: String,
    zoneid: String,
    networkdomain: Option<String>,
    projectid: Option<String>,
}

impl CreateVpcParams {
    pub fn new(
        name: impl Into<String>,
        displaytext: impl Into<String>,
        cidr: impl Into<String>,
        vpcofferingid: impl Into<String>,
        zoneid: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            displaytext: displaytext.into(),
            cidr: cidr.into(),
            vpcofferingid: vpcofferingid.into(),
            zoneid: zoneid.into(),
            networkdomain: None,
            projectid: None,
        }
    }

    pub fn set_networkdomain(&mut self, v: impl Into<String>) {
        self.networkdomain = Some(v.into());
    }

    pub fn set_projectid(&mut self, v: impl Into<String>) {
        self.projectid = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("name", &self.name);
        q.set("displaytext", &self.displaytext);
        q.set("cidr", &self.cidr);
        q.set("vpcofferingid", &self.vpcofferingid);
        q.set("zoneid", &self.zoneid);
        if let Some(v) = &self.networkdomain {
            q.set("networkdomain", v);
        }
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

/// Parameters for `updateVPC`.
#[derive(Debug, Clone)]
pub struct UpdateVpcParams {
    id: String,
    name: Option<String>,
    displaytext: Option<String>,
}

impl UpdateVpcParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            displaytext: None,
        }
    }

    pub fn set_name(&mut self, v: impl Into<String>) {
        self.name = Some(v.into());
    }

    pub fn set_displaytext(&mut self, v: impl Into<String>) {
        self.displaytext = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("id", &self.id);
        if let Some(v) = &self.name {
            q.set("name", v);
        }
        if let Some(v) = &self.displaytext {
            q.set("displaytext", v);
        }
        q
    }
}

impl<'a> VpcService<'a> {
    /// Creates a VPC.
    pub async fn create(&self, p: &CreateVpcParams) -> Result<Vpc> {
        self.cs.execute_async("createVPC", &p.to_query()).await
    }

    /// Updates the name and/or display text of a VPC.
    pub async fn update(&self, p: &UpdateVpcParams) -> Result<Vpc> {
        self.cs.execute_async("updateVPC", &p.to_query()).await
    }

    /// Deletes a VPC by ID.
    pub async fn delete(&self, id: &str) -> Result<SuccessResponse> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.execute_async("deleteVPC", &q).await
    }

    pub async fn list(&self, params: &QueryParams) -> Result<ListVpcsResponse> {
        self.cs.execute("listVPCs", params).await
    }

    /// Fetches a VPC by ID, applying the given list options.
    pub async fn get_by_id(&self, id: &str, opts: &[ListOption]) -> Result<Vpc> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.apply_options(&mut q, opts).await?;
        let r = match self.list(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => return Err(Error::NotFound(format!("VPC {id}"))),
            Err(e) => return Err(e),
        };
        pick_by_id(r.vpcs, id, "VPC")
    }

    // VPC offerings

    pub async fn list_offerings(&self, params: &QueryParams) -> Result<ListVpcOfferingsResponse> {
        self.cs.execute("listVPCOfferings", params).await
    }

    /// Fetches a VPC offering by ID.
    pub async fn get_offering_by_id(&self, id: &str) -> Result<VpcOffering> {
        let mut q = QueryParams::new();
        q.set("id", id);
        let r = match self.list_offerings(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => {
                return Err(Error::NotFound(format!("VPC offering {id}")))
            }
            Err(e) => return Err(e),
        };
        pick_by_id(r.offerings, id, "VPC offering")
    }

    /// Resolves a VPC offering given by name or ID to its ID.
    pub async fn resolve_offering_id(&self, offering: &str) -> Result<String> {
        if is_id(offering) {
            return Ok(offering.to_string());
        }
        let mut q = QueryParams::new();
        q.set("name", offering);
        let r = self.list_offerings(&q).await?;
        pick_by_name(r.offerings, offering, |o| &o.name, "VPC offering").map(|o| o.id)
    }

    // Static routes

    /// Creates a static route towards a private gateway.
    pub async fn create_static_route(&self, cidr: &str, gatewayid: &str) -> Result<StaticRoute> {
        let mut q = QueryParams::new();
        q.set("cidr", cidr);
        q.set("gatewayid", gatewayid);
        self.cs.execute_async("createStaticRoute", &q).await
    }

    /// Deletes a static route by ID.
    pub async fn delete_static_route(&self, id: &str) -> Result<SuccessResponse> {
        let mut q = QueryParams::new();
        q.set("id", id);
        self.cs.execute_async("deleteStaticRoute", &q).await
    }

    pub async fn list_static_routes(&self, params: &QueryParams) -> Result<ListStaticRoutesResponse> {
        self.cs.execute("listStaticRoutes", params).await
    }

    /// Fetches a static route by ID.
    pub async fn get_static_route_by_id(&self, id: &str) -> Result<StaticRoute> {
        let mut q = QueryParams::new();
        q.set("id", id);
        let r = match self.list_static_routes(&q).await {
            Ok(r) => r,
            Err(e) if e.is_entity_gone(id) => {
                return Err(Error::NotFound(format!("static route {id}")))
            }
            Err(e) => return Err(e),
        };
        pick_by_id(r.static_routes, id, "static route")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_params_marshal() {
        let mut p = CreateVpcParams::new(
            "terraform-vpc",
            "terraform-vpc-text",
            "10.0.0.0/8",
            "off-1",
            "z-1",
        );
        p.set_networkdomain("terraform-domain");
        let q = p.to_query();
        assert_eq!(q.get("name"), Some("terraform-vpc"));
        assert_eq!(q.get("cidr"), Some("10.0.0.0/8"));
        assert_eq!(q.get("vpcofferingid"), Some("off-1"));
        assert_eq!(q.get("zoneid"), Some("z-1"));
        assert_eq!(q.get("networkdomain"), Some("terraform-domain"));
        assert!(!q.contains("projectid"));
    }

    #[test]
    fn update_params_marshal() {
        let mut p = UpdateVpcParams::new("vpc-1");
        p.set_displaytext("renamed");
        let q = p.to_query();
        assert_eq!(q.get("id"), Some("vpc-1"));
        assert_eq!(q.get("displaytext"), Some("renamed"));
        assert!(!q.contains("name"));
    }

    #[test]
    fn list_response_decodes() {
        let r: ListVpcsResponse = serde_json::from_str(
            r#"{"count": 1, "vpc": [{
                "id": "vpc-1", "name": "terraform-vpc", "cidr": "10.0.0.0/8",
                "zonename": "Sandbox-simulator", "vpcofferingid": "off-1"
            }]}"#,
        )
        .unwrap();
        assert_eq!(r.vpcs[0].zonename, "Sandbox-simulator");
    }
}
