//! Terraform Plugin Protocol message and service definitions.

pub mod tfplugin6;
