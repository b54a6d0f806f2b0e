//! Provider and resource schemas exposed to Terraform.
//!
//! Attribute flags mirror the classic CloudStack provider: required and
//! optional config fields, computed server-assigned fields, and a
//! force-new set per resource that drives replacement planning.

use std::collections::HashMap;

use crate::proto::tfplugin6::{schema, Schema, StringKind};

fn string_attr(name: &str, description: &str) -> schema::Attribute {
    schema::Attribute {
        name: name.to_string(),
        r#type: b"\"string\"".to_vec(),
        description: description.to_string(),
        description_kind: StringKind::Plain as i32,
        ..Default::default()
    }
}

fn number_attr(name: &str, description: &str) -> schema::Attribute {
    schema::Attribute {
        r#type: b"\"number\"".to_vec(),
        ..string_attr(name, description)
    }
}

fn required(mut attr: schema::Attribute) -> schema::Attribute {
    attr.required = true;
    attr
}

fn optional(mut attr: schema::Attribute) -> schema::Attribute {
    attr.optional = true;
    attr
}

fn computed(mut attr: schema::Attribute) -> schema::Attribute {
    attr.computed = true;
    attr
}

fn sensitive(mut attr: schema::Attribute) -> schema::Attribute {
    attr.sensitive = true;
    attr
}

fn block(attributes: Vec<schema::Attribute>) -> Schema {
    Schema {
        version: 0,
        block: Some(schema::Block {
            version: 0,
            attributes,
            block_types: vec![],
            description: String::new(),
            description_kind: StringKind::Plain as i32,
            deprecated: false,
        }),
    }
}

fn id_attr() -> schema::Attribute {
    computed(string_attr("id", "Server-assigned resource ID"))
}

pub fn provider_schema() -> Schema {
    block(vec![
        optional(string_attr(
            "api_url",
            "CloudStack API endpoint, also taken from CLOUDSTACK_API_URL",
        )),
        optional(string_attr(
            "api_key",
            "API key, also taken from CLOUDSTACK_API_KEY",
        )),
        sensitive(optional(string_attr(
            "secret_key",
            "Secret key, also taken from CLOUDSTACK_SECRET_KEY",
        ))),
        optional(number_attr(
            "timeout",
            "Seconds to wait for async CloudStack jobs",
        )),
    ])
}

fn affinity_group_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("name", "")),
        computed(optional(string_attr("description", ""))),
        required(string_attr("type", "")),
        optional(string_attr("project", "")),
    ])
}

fn network_acl_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("name", "")),
        computed(optional(string_attr("description", ""))),
        optional(string_attr("project", "")),
        required(string_attr("vpc_id", "")),
    ])
}

fn security_group_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("name", "")),
        computed(optional(string_attr("description", ""))),
        optional(string_attr("project", "")),
    ])
}

fn ssh_keypair_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("name", "")),
        optional(string_attr("public_key", "")),
        optional(string_attr("project", "")),
        sensitive(computed(string_attr("private_key", ""))),
        computed(string_attr("fingerprint", "")),
    ])
}

fn static_route_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("cidr", "")),
        required(string_attr("gateway_id", "")),
    ])
}

fn vpn_gateway_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("vpc_id", "")),
        computed(string_attr("public_ip", "")),
    ])
}

fn vpc_schema() -> Schema {
    block(vec![
        id_attr(),
        required(string_attr("name", "")),
        computed(optional(string_attr("display_text", ""))),
        required(string_attr("cidr", "")),
        required(string_attr("vpc_offering", "Offering name or ID")),
        computed(optional(string_attr("network_domain", ""))),
        optional(string_attr("project", "")),
        required(string_attr("zone", "Zone name or ID")),
        computed(string_attr("source_nat_ip", "")),
    ])
}

/// All resource schemas keyed by type name.
pub fn resource_schemas() -> HashMap<String, Schema> {
    [
        ("cloudstack_affinity_group", affinity_group_schema()),
        ("cloudstack_network_acl", network_acl_schema()),
        ("cloudstack_security_group", security_group_schema()),
        ("cloudstack_ssh_keypair", ssh_keypair_schema()),
        ("cloudstack_static_route", static_route_schema()),
        ("cloudstack_vpn_gateway", vpn_gateway_schema()),
        ("cloudstack_vpc", vpc_schema()),
    ]
    .into_iter()
    .map(|(name, schema)| (name.to_string(), schema))
    .collect()
}

/// Attributes that force replacement of the resource when changed.
pub fn force_new_attributes(type_name: &str) -> &'static [&'static str] {
    match type_name {
        "cloudstack_affinity_group" => &["name", "description", "type", "project"],
        "cloudstack_network_acl" => &["name", "description", "project", "vpc_id"],
        "cloudstack_security_group" => &["name", "description", "project"],
        "cloudstack_ssh_keypair" => &["name", "public_key", "project"],
        "cloudstack_static_route" => &["cidr", "gateway_id"],
        "cloudstack_vpn_gateway" => &["vpc_id"],
        // name and display_text update in place via updateVPC
        "cloudstack_vpc" => &["cidr", "vpc_offering", "network_domain", "project", "zone"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_resource_types_are_registered() {
        let schemas = resource_schemas();
        assert_eq!(schemas.len(), 7);
        for type_name in schemas.keys() {
            assert!(type_name.starts_with("cloudstack_"));
            assert!(!force_new_attributes(type_name).is_empty());
        }
    }

    #[test]
    fn vpc_schema_allows_in_place_rename() {
        let force_new = force_new_attributes("cloudstack_vpc");
        assert!(!force_new.contains(&"name"));
        assert!(!force_new.contains(&"display_text"));
        assert!(force_new.contains(&"cidr"));
    }

    #[test]
    fn sensitive_fields_are_flagged() {
        let schemas = resource_schemas();
        let keypair = schemas["cloudstack_ssh_keypair"].block.as_ref().unwrap();
        let private_key = keypair
            .attributes
            .iter()
            .find(|a| a.name == "private_key")
            .unwrap();
        assert!(private_key.sensitive);
        assert!(private_key.computed);

        let provider = provider_schema();
        let secret = provider
            .block
            .unwrap()
            .attributes
            .into_iter()
            .find(|a| a.name == "secret_key")
            .unwrap();
        assert!(secret.sensitive);
    }

    #[test]
    fn required_and_computed_flags() {
        let schemas = resource_schemas();
        let vpc = schemas["cloudstack_vpc"].block.as_ref().unwrap();
        let by_name: std::collections::HashMap<_, _> =
            vpc.attributes.iter().map(|a| (a.name.as_str(), a)).collect();
        assert!(by_name["name"].required);
        assert!(by_name["source_nat_ip"].computed);
        assert!(!by_name["source_nat_ip"].required);
        assert!(by_name["display_text"].optional && by_name["display_text"].computed);
    }
}
