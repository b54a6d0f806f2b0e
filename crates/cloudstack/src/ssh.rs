//! SSH key pair service. Key pairs are identified by name, not ID.

use serde::Deserialize;

use crate::client::{CloudStackClient, SuccessResponse};
use crate::error::Result;
use crate::options::ListOption;
use crate::params::QueryParams;

pub struct SshService<'a> {
    cs: &'a CloudStackClient,
}

impl CloudStackClient {
    pub fn ssh(&self) -> SshService<'_> {
        SshService { cs: self }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SshKeyPair {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fingerprint: String,
    /// Only present in the response of `createSSHKeyPair`.
    #[serde(default)]
    pub privatekey: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub domainid: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListSshKeyPairsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "sshkeypair")]
    pub key_pairs: Vec<SshKeyPair>,
}

/// Parameters for `registerSSHKeyPair`.
#[derive(Debug, Clone)]
pub struct RegisterSshKeyPairParams {
    name: String,
    publickey: String,
    projectid: Option<String>,
}

impl RegisterSshKeyPairParams {
    pub fn new(name: impl Into<String>, publickey: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            publickey: publickey.into(),
            projectid: None,
        }
    }

    pub fn set_projectid(&mut self, v: impl Into<String>) {
        self.projectid = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("name", &self.name);
        q.set("publickey", &self.publickey);
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

/// Parameters for `createSSHKeyPair`.
#[derive(Debug, Clone)]
pub struct CreateSshKeyPairParams {
    name: String,
    projectid: Option<String>,
}

impl CreateSshKeyPairParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projectid: None,
        }
    }

    pub fn set_projectid(&mut self, v: impl Into<String>) {
        self.projectid = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("name", &self.name);
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

/// Parameters for `deleteSSHKeyPair`.
#[derive(Debug, Clone)]
pub struct DeleteSshKeyPairParams {
    name: String,
    projectid: Option<String>,
}

impl DeleteSshKeyPairParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projectid: None,
        }
    }

    pub fn set_projectid(&mut self, v: impl Into<String>) {
        self.projectid = Some(v.into());
    }

    fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set("name", &self.name);
        if let Some(v) = &self.projectid {
            q.set("projectid", v);
        }
        q
    }
}

impl<'a> SshService<'a> {
    /// Registers a user-supplied public key.
    pub async fn register_key_pair(&self, p: &RegisterSshKeyPairParams) -> Result<SshKeyPair> {
        self.cs
            .execute_nested("registerSSHKeyPair", &p.to_query())
            .await
    }

    /// Creates a new key pair server-side; the response carries the
    /// private key, which the server never returns again.
    pub async fn create_key_pair(&self, p: &CreateSshKeyPairParams) -> Result<SshKeyPair> {
        self.cs
            .execute_nested("createSSHKeyPair", &p.to_query())
            .await
    }

    /// Deletes a key pair by name.
    pub async fn delete_key_pair(&self, p: &DeleteSshKeyPairParams) -> Result<SuccessResponse> {
        self.cs.execute("deleteSSHKeyPair", &p.to_query()).await
    }

    pub async fn list_key_pairs(&self, params: &QueryParams) -> Result<ListSshKeyPairsResponse> {
        self.cs.execute("listSSHKeyPairs", params).await
    }

    /// Lists key pairs with the given name, applying list options.
    /// Key pair names are unique per account, so callers take the first
    /// match and only need to distinguish zero from some.
    pub async fn find_key_pair(
        &self,
        name: &str,
        opts: &[ListOption],
    ) -> Result<Option<SshKeyPair>> {
        let mut q = QueryParams::new();
        q.set("name", name);
        self.cs.apply_options(&mut q, opts).await?;
        let mut r = self.list_key_pairs(&q).await?;
        if r.key_pairs.is_empty() {
            return Ok(None);
        }
        Ok(Some(r.key_pairs.remove(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_params_marshal() {
        let p = RegisterSshKeyPairParams::new("deploy", "ssh-rsa AAAB3");
        let q = p.to_query();
        assert_eq!(q.get("name"), Some("deploy"));
        assert_eq!(q.get("publickey"), Some("ssh-rsa AAAB3"));
    }

    #[test]
    fn keypair_decodes_with_private_key() {
        let kp: SshKeyPair = serde_json::from_str(
            r#"{"name": "deploy", "fingerprint": "aa:bb", "privatekey": "-----BEGIN"}"#,
        )
        .unwrap();
        assert_eq!(kp.fingerprint, "aa:bb");
        assert!(!kp.privatekey.is_empty());
    }
}
