//! Apache CloudStack API client.
//!
//! CloudStack exposes a signed query-string HTTP API: every call names a
//! command, carries its parameters as sorted query parameters, and is
//! authenticated with an HMAC-SHA1 signature over the lowercased query
//! string. Responses are JSON, wrapped in a single `<command>response`
//! envelope, and mutating commands usually complete through an async job
//! that has to be polled.
//!
//! The crate is organised as one module per API service, each offering
//! typed parameter bags, response structs, and "courtesy" lookup helpers
//! that list-then-filter by name or ID.

pub mod address;
pub mod affinity_group;
pub mod client;
pub mod error;
pub mod network_acl;
pub mod options;
pub mod params;
pub mod project;
pub mod security_group;
pub mod ssh;
pub mod vpc;
pub mod vpn;
pub mod zone;

mod lookup;

pub use client::{CloudStackClient, SuccessResponse};
pub use error::{Error, Result};
pub use lookup::is_id;
pub use options::ListOption;
pub use params::QueryParams;
