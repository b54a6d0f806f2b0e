//! CloudStack Terraform Provider
//!
//! This crate implements a Terraform provider for Apache CloudStack using
//! the Terraform Plugin Protocol v6.

pub mod proto;
pub mod provider;
pub mod resources;
pub mod retry;
pub mod schema;
pub mod state;
