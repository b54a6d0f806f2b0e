//! VPC resource handler for Terraform

use anyhow::Result;
use cloudstack::options::project_scope;
use cloudstack::vpc::{CreateVpcParams, UpdateVpcParams, Vpc};
use cloudstack::CloudStackClient;
use tracing::info;

use super::{project_id_for, Resource};
use crate::state::{
    get_optional_string_attr, get_string_attr, make_state, optional_string_value, string_value,
    DynamicValue,
};

pub struct VpcResource;

#[async_trait::async_trait]
impl Resource for VpcResource {
    fn type_name() -> &'static str {
        "cloudstack_vpc"
    }

    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue> {
        let name = get_string_attr(config, "name");
        let cidr = get_string_attr(config, "cidr");
        let display_text = get_optional_string_attr(config, "display_text")
            .unwrap_or_else(|| name.clone());

        let offering = get_string_attr(config, "vpc_offering");
        let offering_id = cs.vpc().resolve_offering_id(&offering).await?;
        let zone = get_string_attr(config, "zone");
        let zone_id = cs.zone().resolve_id(&zone).await?;

        let mut p = CreateVpcParams::new(&name, &display_text, &cidr, &offering_id, &zone_id);
        if let Some(domain) = get_optional_string_attr(config, "network_domain") {
            p.set_networkdomain(domain);
        }
        let project = get_optional_string_attr(config, "project");
        let project_id = project_id_for(cs, project.as_deref()).await?;
        if let Some(id) = &project_id {
            p.set_projectid(id);
        }

        let vpc = cs.vpc().create(&p).await?;
        info!(id = %vpc.id, name = %name, "created VPC");
        finish_state(cs, &vpc, &offering, &zone, project.as_deref(), project_id.as_deref()).await
    }

    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let project = get_optional_string_attr(state, "project");
        let opts = project_scope(project.clone());
        let vpc = cs.vpc().get_by_id(&id, &opts).await?;
        let project_id = project_id_for(cs, project.as_deref()).await?;
        // Keep the offering and zone in whichever form (name or ID) the
        // configuration used, so a refresh does not rewrite them.
        let offering = get_string_attr(state, "vpc_offering");
        let zone = get_string_attr(state, "zone");
        finish_state(cs, &vpc, &offering, &zone, project.as_deref(), project_id.as_deref()).await
    }

    async fn update(
        cs: &CloudStackClient,
        state: &DynamicValue,
        config: &DynamicValue,
    ) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let name = get_string_attr(config, "name");
        let display_text = get_optional_string_attr(config, "display_text")
            .unwrap_or_else(|| name.clone());

        // Name and display text are the only attributes that can change
        // without replacing the VPC.
        let changed = get_string_attr(state, "name") != name
            || get_string_attr(state, "display_text") != display_text;
        if changed {
            let mut p = UpdateVpcParams::new(&id);
            p.set_name(&name);
            p.set_displaytext(&display_text);
            cs.vpc().update(&p).await?;
            info!(id = %id, "updated VPC");
        }

        Self::read(cs, state).await
    }

    async fn delete(cs: &CloudStackClient, state: &DynamicValue) -> Result<()> {
        let id = get_string_attr(state, "id");
        match cs.vpc().delete(&id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_entity_gone(&id) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Builds the state map, filling in the computed attributes that are not
/// part of the VPC payload itself. `offering_setting` and `zone_setting`
/// are the configured values, kept in their configured form.
async fn finish_state(
    cs: &CloudStackClient,
    vpc: &Vpc,
    offering_setting: &str,
    zone_setting: &str,
    project: Option<&str>,
    project_id: Option<&str>,
) -> Result<DynamicValue> {
    // Only look the offering name up when the configuration refers to it
    // by name; an ID-form setting is answered by the VPC payload itself.
    let offering = if cloudstack::is_id(offering_setting) {
        vpc.vpcofferingid.clone()
    } else {
        cs.vpc().get_offering_by_id(&vpc.vpcofferingid).await?.name
    };
    let zone = value_or_id(zone_setting, &vpc.zonename, &vpc.zoneid);
    let source_nat_ip = cs
        .address()
        .source_nat_ip_for_vpc(&vpc.id, project_id)
        .await?;
    vpc_to_state(vpc, &offering, &zone, project, source_nat_ip.as_deref())
}

/// Picks the server's name or ID for an attribute depending on which form
/// the configuration used.
fn value_or_id<'a>(configured: &str, name: &'a str, id: &'a str) -> &'a str {
    if cloudstack::is_id(configured) {
        id
    } else {
        name
    }
}

fn vpc_to_state(
    vpc: &Vpc,
    offering: &str,
    zone: &str,
    project: Option<&str>,
    source_nat_ip: Option<&str>,
) -> Result<DynamicValue> {
    Ok(make_state(vec![
        ("id", string_value(&vpc.id)),
        ("name", string_value(&vpc.name)),
        ("display_text", optional_string_value(&vpc.displaytext)),
        ("cidr", string_value(&vpc.cidr)),
        ("vpc_offering", string_value(offering)),
        ("network_domain", optional_string_value(&vpc.networkdomain)),
        ("project", optional_string_value(project.unwrap_or_default())),
        ("zone", string_value(zone)),
        (
            "source_nat_ip",
            optional_string_value(source_nat_ip.unwrap_or_default()),
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vpc() -> Vpc {
        Vpc {
            id: "vpc-1".to_string(),
            name: "main".to_string(),
            displaytext: "main vpc".to_string(),
            cidr: "10.0.0.0/16".to_string(),
            networkdomain: "internal.lan".to_string(),
            vpcofferingid: "a3a093e8-47f8-4dca-b2f6-4b38d7a32800".to_string(),
            zoneid: "9f9d1cee-9a3c-418c-9c02-7f7befd4e915".to_string(),
            zonename: "eu-west-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn maps_vpc_fields_to_state() {
        let state =
            vpc_to_state(&sample_vpc(), "Default VPC offering", "eu-west-1", None, None).unwrap();
        assert_eq!(state.get("id").unwrap().as_string(), Some("vpc-1"));
        assert_eq!(
            state.get("vpc_offering").unwrap().as_string(),
            Some("Default VPC offering")
        );
        assert_eq!(state.get("zone").unwrap().as_string(), Some("eu-west-1"));
        assert!(state.get("source_nat_ip").unwrap().is_null());
    }

    #[test]
    fn records_source_nat_ip_when_present() {
        let state = vpc_to_state(&sample_vpc(), "Default", "eu-west-1", None, Some("203.0.113.20"))
            .unwrap();
        assert_eq!(
            state.get("source_nat_ip").unwrap().as_string(),
            Some("203.0.113.20")
        );
    }

    #[test]
    fn zone_keeps_the_configured_form() {
        let vpc = sample_vpc();
        // Configured by name: the name goes back to state.
        assert_eq!(value_or_id("eu-west-1", &vpc.zonename, &vpc.zoneid), "eu-west-1");
        // Configured by ID: the ID goes back to state, even though the
        // server also reports the zone name.
        assert_eq!(
            value_or_id(&vpc.zoneid, &vpc.zonename, &vpc.zoneid),
            "9f9d1cee-9a3c-418c-9c02-7f7befd4e915"
        );
    }
}
