//! CloudStack Terraform Provider Implementation
//!
//! Implements the Terraform Plugin Protocol v6 Provider service.

use std::sync::Arc;
use std::time::Duration;

use cloudstack::CloudStackClient;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::proto::tfplugin6::provider_server::Provider;
use crate::proto::tfplugin6::*;
use crate::resources::{
    affinity_group::AffinityGroupResource, network_acl::NetworkAclResource,
    security_group::SecurityGroupResource, ssh_keypair::SshKeyPairResource,
    static_route::StaticRouteResource, vpc::VpcResource, vpn_gateway::VpnGatewayResource,
    Resource,
};
use crate::schema;
use crate::state::{
    decode_dynamic_value, encode_dynamic_value, get_int_attr, get_optional_string_attr,
    make_state, string_value, DynamicValue as LocalDynamicValue,
};

/// CloudStack Terraform Provider
pub struct CloudStackProvider {
    /// Configured API client, populated by ConfigureProvider.
    client: Arc<RwLock<Option<CloudStackClient>>>,
}

impl CloudStackProvider {
    pub fn new() -> Self {
        Self {
            client: Arc::new(RwLock::new(None)),
        }
    }

    async fn get_client(&self) -> Result<CloudStackClient, Status> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| Status::failed_precondition("provider is not configured"))
    }
}

impl Default for CloudStackProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn error_diagnostic(summary: &str, detail: impl ToString) -> Diagnostic {
    Diagnostic {
        severity: diagnostic::Severity::Error as i32,
        summary: summary.to_string(),
        detail: detail.to_string(),
        attribute: None,
    }
}

fn encoded_state(state: &LocalDynamicValue) -> Result<DynamicValue, Status> {
    let msgpack = encode_dynamic_value(state)
        .map_err(|e| Status::internal(format!("Failed to encode state: {}", e)))?;
    Ok(DynamicValue {
        msgpack,
        json: vec![],
    })
}

fn unknown_type(type_name: &str) -> Status {
    Status::not_found(format!("Unknown resource type: {}", type_name))
}

/// Reads a provider config attribute, falling back to the environment.
fn config_or_env(config: &LocalDynamicValue, attr: &str, env: &str) -> Option<String> {
    get_optional_string_attr(config, attr).or_else(|| std::env::var(env).ok())
}

async fn dispatch_read(
    type_name: &str,
    cs: &CloudStackClient,
    state: &LocalDynamicValue,
) -> Result<anyhow::Result<LocalDynamicValue>, Status> {
    Ok(match type_name {
        "cloudstack_affinity_group" => AffinityGroupResource::read(cs, state).await,
        "cloudstack_network_acl" => NetworkAclResource::read(cs, state).await,
        "cloudstack_security_group" => SecurityGroupResource::read(cs, state).await,
        "cloudstack_ssh_keypair" => SshKeyPairResource::read(cs, state).await,
        "cloudstack_static_route" => StaticRouteResource::read(cs, state).await,
        "cloudstack_vpc" => VpcResource::read(cs, state).await,
        "cloudstack_vpn_gateway" => VpnGatewayResource::read(cs, state).await,
        _ => return Err(unknown_type(type_name)),
    })
}

async fn dispatch_create(
    type_name: &str,
    cs: &CloudStackClient,
    config: &LocalDynamicValue,
) -> Result<anyhow::Result<LocalDynamicValue>, Status> {
    Ok(match type_name {
        "cloudstack_affinity_group" => AffinityGroupResource::create(cs, config).await,
        "cloudstack_network_acl" => NetworkAclResource::create(cs, config).await,
        "cloudstack_security_group" => SecurityGroupResource::create(cs, config).await,
        "cloudstack_ssh_keypair" => SshKeyPairResource::create(cs, config).await,
        "cloudstack_static_route" => StaticRouteResource::create(cs, config).await,
        "cloudstack_vpc" => VpcResource::create(cs, config).await,
        "cloudstack_vpn_gateway" => VpnGatewayResource::create(cs, config).await,
        _ => return Err(unknown_type(type_name)),
    })
}

async fn dispatch_update(
    type_name: &str,
    cs: &CloudStackClient,
    prior: &LocalDynamicValue,
    planned: &LocalDynamicValue,
) -> Result<anyhow::Result<LocalDynamicValue>, Status> {
    Ok(match type_name {
        "cloudstack_affinity_group" => AffinityGroupResource::update(cs, prior, planned).await,
        "cloudstack_network_acl" => NetworkAclResource::update(cs, prior, planned).await,
        "cloudstack_security_group" => SecurityGroupResource::update(cs, prior, planned).await,
        "cloudstack_ssh_keypair" => SshKeyPairResource::update(cs, prior, planned).await,
        "cloudstack_static_route" => StaticRouteResource::update(cs, prior, planned).await,
        "cloudstack_vpc" => VpcResource::update(cs, prior, planned).await,
        "cloudstack_vpn_gateway" => VpnGatewayResource::update(cs, prior, planned).await,
        _ => return Err(unknown_type(type_name)),
    })
}

async fn dispatch_delete(
    type_name: &str,
    cs: &CloudStackClient,
    state: &LocalDynamicValue,
) -> Result<anyhow::Result<()>, Status> {
    Ok(match type_name {
        "cloudstack_affinity_group" => AffinityGroupResource::delete(cs, state).await,
        "cloudstack_network_acl" => NetworkAclResource::delete(cs, state).await,
        "cloudstack_security_group" => SecurityGroupResource::delete(cs, state).await,
        "cloudstack_ssh_keypair" => SshKeyPairResource::delete(cs, state).await,
        "cloudstack_static_route" => StaticRouteResource::delete(cs, state).await,
        "cloudstack_vpc" => VpcResource::delete(cs, state).await,
        "cloudstack_vpn_gateway" => VpnGatewayResource::delete(cs, state).await,
        _ => return Err(unknown_type(type_name)),
    })
}

/// True when the error means the remote object no longer exists, which
/// clears the state instead of failing the refresh.
fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<cloudstack::Error>()
        .is_some_and(|e| e.is_not_found())
}

/// Attribute paths whose values changed between prior and planned state,
/// limited to the attributes that force a replacement.
fn replacement_paths(
    type_name: &str,
    prior: &LocalDynamicValue,
    planned: &LocalDynamicValue,
) -> Vec<AttributePath> {
    // A missing attribute, a null and an empty string all mean "unset".
    fn normalized(value: Option<&LocalDynamicValue>) -> LocalDynamicValue {
        match value {
            Some(LocalDynamicValue::String(s)) if s.is_empty() => LocalDynamicValue::Null,
            Some(v) => v.clone(),
            None => LocalDynamicValue::Null,
        }
    }

    schema::force_new_attributes(type_name)
        .iter()
        .filter(|attr| normalized(prior.get(attr)) != normalized(planned.get(attr)))
        .map(|attr| AttributePath {
            steps: vec![attribute_path::Step {
                selector: Some(attribute_path::step::Selector::AttributeName(
                    attr.to_string(),
                )),
            }],
        })
        .collect()
}

#[derive(Debug, PartialEq)]
enum ChangeKind {
    Create,
    Update,
    Delete,
    Noop,
}

/// Routes an apply on state nullity. Prior state decides create vs the
/// rest: the planned state of a create is full of unknown values, so
/// only its overall nullity can be trusted.
fn change_kind(prior: &LocalDynamicValue, planned: &LocalDynamicValue) -> ChangeKind {
    match (prior.is_null(), planned.is_null()) {
        (true, false) => ChangeKind::Create,
        (false, true) => ChangeKind::Delete,
        (false, false) => ChangeKind::Update,
        (true, true) => ChangeKind::Noop,
    }
}

/// Resource types that can be imported by ID. Static routes and SSH key
/// pairs carry attributes that cannot be recovered from the API alone.
const IMPORTABLE: &[&str] = &[
    "cloudstack_affinity_group",
    "cloudstack_network_acl",
    "cloudstack_security_group",
    "cloudstack_vpc",
    "cloudstack_vpn_gateway",
];

#[tonic::async_trait]
impl Provider for CloudStackProvider {
    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> Result<Response<get_provider_schema::Response>, Status> {
        info!("GetProviderSchema called");

        let response = get_provider_schema::Response {
            provider: Some(schema::provider_schema()),
            resource_schemas: schema::resource_schemas(),
            data_source_schemas: std::collections::HashMap::new(),
            diagnostics: vec![],
            provider_meta: None,
            server_capabilities: Some(ServerCapabilities {
                plan_destroy: true,
                get_provider_schema_optional: false,
                move_resource_state: false,
            }),
            functions: std::collections::HashMap::new(),
        };

        Ok(Response::new(response))
    }

    async fn validate_provider_config(
        &self,
        _request: Request<validate_provider_config::Request>,
    ) -> Result<Response<validate_provider_config::Response>, Status> {
        debug!("ValidateProviderConfig called");

        Ok(Response::new(validate_provider_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> Result<Response<validate_resource_config::Response>, Status> {
        debug!("ValidateResourceConfig called for {}", request.get_ref().type_name);

        Ok(Response::new(validate_resource_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn validate_data_resource_config(
        &self,
        _request: Request<validate_data_resource_config::Request>,
    ) -> Result<Response<validate_data_resource_config::Response>, Status> {
        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> Result<Response<upgrade_resource_state::Response>, Status> {
        debug!("UpgradeResourceState called");

        // Schema version 0 everywhere, so the stored JSON passes through.
        let req = request.into_inner();

        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state: req.raw_state.map(|rs| DynamicValue {
                msgpack: vec![],
                json: rs.json,
            }),
            diagnostics: vec![],
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> Result<Response<configure_provider::Response>, Status> {
        info!("ConfigureProvider called");

        let req = request.into_inner();
        let config = req
            .config
            .map(|c| decode_dynamic_value(&c.msgpack))
            .unwrap_or_default();

        let api_url = config_or_env(&config, "api_url", "CLOUDSTACK_API_URL");
        let api_key = config_or_env(&config, "api_key", "CLOUDSTACK_API_KEY");
        let secret_key = config_or_env(&config, "secret_key", "CLOUDSTACK_SECRET_KEY");

        let (api_url, api_key, secret_key) = match (api_url, api_key, secret_key) {
            (Some(u), Some(a), Some(s)) => (u, a, s),
            _ => {
                return Ok(Response::new(configure_provider::Response {
                    diagnostics: vec![error_diagnostic(
                        "Incomplete provider configuration",
                        "api_url, api_key and secret_key must be set, either in the \
                         provider block or via the CLOUDSTACK_API_URL, CLOUDSTACK_API_KEY \
                         and CLOUDSTACK_SECRET_KEY environment variables",
                    )],
                }));
            }
        };

        let mut client = CloudStackClient::new(&api_url, &api_key, &secret_key);
        let timeout = get_int_attr(&config, "timeout", 0);
        if timeout > 0 {
            client = client.with_async_timeout(Duration::from_secs(timeout as u64));
        }

        info!(api_url = %api_url, "configured CloudStack client");
        *self.client.write().await = Some(client);

        Ok(Response::new(configure_provider::Response {
            diagnostics: vec![],
        }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> Result<Response<read_resource::Response>, Status> {
        let req = request.into_inner();
        info!("ReadResource called for {}", req.type_name);

        let cs = self.get_client().await?;

        let current_state = req
            .current_state
            .map(|s| decode_dynamic_value(&s.msgpack))
            .unwrap_or_default();

        match dispatch_read(&req.type_name, &cs, &current_state).await? {
            Ok(state) => Ok(Response::new(read_resource::Response {
                new_state: Some(encoded_state(&state)?),
                diagnostics: vec![],
                private: vec![],
                deferred: None,
            })),
            // Cleared state tells Terraform the object is gone. Any other
            // failure is reported instead of silently dropping the object.
            Err(e) if is_not_found(&e) => {
                info!("{} no longer exists, clearing state", req.type_name);
                Ok(Response::new(read_resource::Response {
                    new_state: None,
                    diagnostics: vec![],
                    private: vec![],
                    deferred: None,
                }))
            }
            Err(e) => Ok(Response::new(read_resource::Response {
                new_state: None,
                diagnostics: vec![error_diagnostic("Failed to read resource", e)],
                private: vec![],
                deferred: None,
            })),
        }
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> Result<Response<plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        debug!("PlanResourceChange called for {}", req.type_name);

        let prior = req
            .prior_state
            .as_ref()
            .map(|s| decode_dynamic_value(&s.msgpack))
            .unwrap_or_default();
        let planned = req
            .proposed_new_state
            .as_ref()
            .map(|s| decode_dynamic_value(&s.msgpack))
            .unwrap_or_default();

        // Replacement only matters when an object exists on both sides of
        // the diff. Creates and destroys carry a null on one side.
        let requires_replace = if prior.is_null() || planned.is_null() {
            vec![]
        } else {
            replacement_paths(&req.type_name, &prior, &planned)
        };

        Ok(Response::new(plan_resource_change::Response {
            planned_state: req.proposed_new_state,
            requires_replace,
            planned_private: vec![],
            diagnostics: vec![],
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> Result<Response<apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        info!("ApplyResourceChange called for {}", req.type_name);

        let cs = self.get_client().await?;

        let prior = req
            .prior_state
            .map(|s| decode_dynamic_value(&s.msgpack))
            .unwrap_or_default();
        let planned = req
            .planned_state
            .map(|s| decode_dynamic_value(&s.msgpack))
            .unwrap_or_default();

        let result = match change_kind(&prior, &planned) {
            ChangeKind::Create => dispatch_create(&req.type_name, &cs, &planned).await?,
            ChangeKind::Delete => dispatch_delete(&req.type_name, &cs, &prior)
                .await?
                .map(|_| LocalDynamicValue::Null),
            ChangeKind::Update => dispatch_update(&req.type_name, &cs, &prior, &planned).await?,
            ChangeKind::Noop => Ok(LocalDynamicValue::Null),
        };

        match result {
            Ok(new_state) => Ok(Response::new(apply_resource_change::Response {
                new_state: Some(encoded_state(&new_state)?),
                private: vec![],
                diagnostics: vec![],
                legacy_type_system: false,
            })),
            Err(e) => Ok(Response::new(apply_resource_change::Response {
                new_state: None,
                private: vec![],
                diagnostics: vec![error_diagnostic("Failed to apply resource change", e)],
                legacy_type_system: false,
            })),
        }
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> Result<Response<import_resource_state::Response>, Status> {
        let req = request.into_inner();
        info!("ImportResourceState called for {} with ID {}", req.type_name, req.id);

        if !IMPORTABLE.contains(&req.type_name.as_str()) {
            return Ok(Response::new(import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: vec![error_diagnostic(
                    "Resource does not support import",
                    format!("{} cannot be imported", req.type_name),
                )],
                deferred: None,
            }));
        }

        let cs = self.get_client().await?;

        // Seed a state with just the ID and refresh the rest from the API.
        let initial_state = make_state(vec![("id", string_value(&req.id))]);

        match dispatch_read(&req.type_name, &cs, &initial_state).await? {
            Ok(state) => Ok(Response::new(import_resource_state::Response {
                imported_resources: vec![import_resource_state::ImportedResource {
                    type_name: req.type_name,
                    state: Some(encoded_state(&state)?),
                    private: vec![],
                }],
                diagnostics: vec![],
                deferred: None,
            })),
            Err(e) => Ok(Response::new(import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: vec![error_diagnostic("Failed to import resource", e)],
                deferred: None,
            })),
        }
    }

    async fn move_resource_state(
        &self,
        _request: Request<move_resource_state::Request>,
    ) -> Result<Response<move_resource_state::Response>, Status> {
        Ok(Response::new(move_resource_state::Response {
            target_state: None,
            diagnostics: vec![],
        }))
    }

    async fn read_data_source(
        &self,
        _request: Request<read_data_source::Request>,
    ) -> Result<Response<read_data_source::Response>, Status> {
        Ok(Response::new(read_data_source::Response {
            state: None,
            diagnostics: vec![],
            deferred: None,
        }))
    }

    async fn get_functions(
        &self,
        _request: Request<get_functions::Request>,
    ) -> Result<Response<get_functions::Response>, Status> {
        Ok(Response::new(get_functions::Response {
            functions: std::collections::HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn call_function(
        &self,
        _request: Request<call_function::Request>,
    ) -> Result<Response<call_function::Response>, Status> {
        Err(Status::unimplemented("Functions not implemented"))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> Result<Response<stop_provider::Response>, Status> {
        info!("StopProvider called");
        Ok(Response::new(stop_provider::Response {
            error: String::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::get_string_attr;

    fn state(attrs: Vec<(&str, &str)>) -> LocalDynamicValue {
        make_state(
            attrs
                .into_iter()
                .map(|(k, v)| (k, string_value(v)))
                .collect(),
        )
    }

    fn path_names(paths: &[AttributePath]) -> Vec<String> {
        paths
            .iter()
            .flat_map(|p| &p.steps)
            .filter_map(|s| match &s.selector {
                Some(attribute_path::step::Selector::AttributeName(n)) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn create_is_routed_by_null_prior_state() {
        // Terraform's planned state for a create carries msgpack
        // extension 0 for every computed attribute, `id` included.
        let planned = rmpv::Value::Map(vec![
            ("id".into(), rmpv::Value::Ext(0, vec![0])),
            ("name".into(), "web".into()),
        ]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &planned).unwrap();

        let planned = decode_dynamic_value(&buf);
        assert_eq!(change_kind(&LocalDynamicValue::Null, &planned), ChangeKind::Create);
        assert_eq!(get_string_attr(&planned, "name"), "web");
    }

    #[test]
    fn apply_routing_covers_all_transitions() {
        let existing = state(vec![("id", "sg-1"), ("name", "web")]);
        let null = LocalDynamicValue::Null;
        assert_eq!(change_kind(&null, &existing), ChangeKind::Create);
        assert_eq!(change_kind(&existing, &null), ChangeKind::Delete);
        assert_eq!(change_kind(&existing, &existing), ChangeKind::Update);
        assert_eq!(change_kind(&null, &null), ChangeKind::Noop);
    }

    #[test]
    fn changed_force_new_attribute_requires_replace() {
        let prior = state(vec![("id", "sg-1"), ("name", "old"), ("project", "")]);
        let planned = state(vec![("id", "sg-1"), ("name", "new"), ("project", "")]);
        let paths = replacement_paths("cloudstack_security_group", &prior, &planned);
        assert_eq!(path_names(&paths), vec!["name"]);
    }

    #[test]
    fn unchanged_plan_requires_no_replace() {
        let prior = state(vec![("id", "sg-1"), ("name", "web")]);
        let planned = state(vec![("id", "sg-1"), ("name", "web")]);
        assert!(replacement_paths("cloudstack_security_group", &prior, &planned).is_empty());
    }

    #[test]
    fn vpc_rename_is_in_place() {
        let prior = state(vec![("id", "vpc-1"), ("name", "old"), ("cidr", "10.0.0.0/16")]);
        let planned = state(vec![("id", "vpc-1"), ("name", "new"), ("cidr", "10.0.0.0/16")]);
        assert!(replacement_paths("cloudstack_vpc", &prior, &planned).is_empty());
    }

    #[test]
    fn vpc_cidr_change_requires_replace() {
        let prior = state(vec![("id", "vpc-1"), ("cidr", "10.0.0.0/16")]);
        let planned = state(vec![("id", "vpc-1"), ("cidr", "172.16.0.0/16")]);
        let paths = replacement_paths("cloudstack_vpc", &prior, &planned);
        assert_eq!(path_names(&paths), vec!["cidr"]);
    }

    #[test]
    fn missing_and_null_attributes_compare_equal() {
        let prior = state(vec![("id", "sg-1"), ("name", "web"), ("project", "")]);
        let planned = state(vec![("id", "sg-1"), ("name", "web")]);
        assert!(replacement_paths("cloudstack_security_group", &prior, &planned).is_empty());
    }
}
