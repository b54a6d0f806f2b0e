//! VPN gateway resource handler for Terraform

use anyhow::Result;
use cloudstack::vpn::VpnGateway;
use cloudstack::CloudStackClient;
use tracing::info;

use super::Resource;
use crate::state::{get_string_attr, make_state, string_value, DynamicValue};

pub struct VpnGatewayResource;

#[async_trait::async_trait]
impl Resource for VpnGatewayResource {
    fn type_name() -> &'static str {
        "cloudstack_vpn_gateway"
    }

    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue> {
        let vpc_id = get_string_attr(config, "vpc_id");
        let gateway = cs.vpn().create_gateway(&vpc_id).await?;
        info!(id = %gateway.id, vpc_id = %vpc_id, "created VPN gateway");
        gateway_to_state(&gateway)
    }

    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let gateway = cs.vpn().get_gateway_by_id(&id).await?;
        gateway_to_state(&gateway)
    }

    async fn update(
        cs: &CloudStackClient,
        state: &DynamicValue,
        _config: &DynamicValue,
    ) -> Result<DynamicValue> {
        Self::read(cs, state).await
    }

    async fn delete(cs: &CloudStackClient, state: &DynamicValue) -> Result<()> {
        let id = get_string_attr(state, "id");
        match cs.vpn().delete_gateway(&id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_entity_gone(&id) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn gateway_to_state(gateway: &VpnGateway) -> Result<DynamicValue> {
    Ok(make_state(vec![
        ("id", string_value(&gateway.id)),
        ("vpc_id", string_value(&gateway.vpcid)),
        ("public_ip", string_value(&gateway.publicip)),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_gateway_fields_to_state() {
        let gateway = VpnGateway {
            id: "vpngw-1".to_string(),
            publicip: "203.0.113.10".to_string(),
            vpcid: "vpc-1".to_string(),
            ..Default::default()
        };
        let state = gateway_to_state(&gateway).unwrap();
        assert_eq!(state.get("id").unwrap().as_string(), Some("vpngw-1"));
        assert_eq!(state.get("public_ip").unwrap().as_string(), Some("203.0.113.10"));
        assert_eq!(state.get("vpc_id").unwrap().as_string(), Some("vpc-1"));
    }
}
