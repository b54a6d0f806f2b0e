//! Static route resource handler for Terraform

use anyhow::Result;
use cloudstack::vpc::StaticRoute;
use cloudstack::CloudStackClient;
use tracing::info;

use super::Resource;
use crate::state::{get_string_attr, make_state, string_value, DynamicValue};

pub struct StaticRouteResource;

#[async_trait::async_trait]
impl Resource for StaticRouteResource {
    fn type_name() -> &'static str {
        "cloudstack_static_route"
    }

    async fn create(cs: &CloudStackClient, config: &DynamicValue) -> Result<DynamicValue> {
        let cidr = get_string_attr(config, "cidr");
        let gateway_id = get_string_attr(config, "gateway_id");

        let route = cs.vpc().create_static_route(&cidr, &gateway_id).await?;
        info!(id = %route.id, cidr = %cidr, "created static route");
        route_to_state(&route)
    }

    async fn read(cs: &CloudStackClient, state: &DynamicValue) -> Result<DynamicValue> {
        let id = get_string_attr(state, "id");
        let route = cs.vpc().get_static_route_by_id(&id).await?;
        route_to_state(&route)
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
        match cs.vpc().delete_static_route(&id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_entity_gone(&id) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn route_to_state(route: &StaticRoute) -> Result<DynamicValue> {
    Ok(make_state(vec![
        ("id", string_value(&route.id)),
        ("cidr", string_value(&route.cidr)),
        ("gateway_id", string_value(&route.gatewayid)),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_route_fields_to_state() {
        let route = StaticRoute {
            id: "route-1".to_string(),
            cidr: "10.0.1.0/24".to_string(),
            gatewayid: "gw-1".to_string(),
            ..Default::default()
        };
        let state = route_to_state(&route).unwrap();
        assert_eq!(state.get("id").unwrap().as_string(), Some("route-1"));
        assert_eq!(state.get("cidr").unwrap().as_string(), Some("10.0.1.0/24"));
        assert_eq!(state.get("gateway_id").unwrap().as_string(), Some("gw-1"));
    }
}
