//! DID registry lookups.
//!
//! The registry maps a DID to the JSON list of public keys registered for
//! it. [`RpcRegistry`] reads the ONT ID native contract through an Ontology
//! node; [`StaticRegistry`] serves documents from memory.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::invoke::{
    build_native_invoke_code, InvokeTransaction, ONT_ID_CONTRACT, ONT_ID_CONTRACT_VERSION,
};

const GET_PUBLIC_KEYS_METHOD: &str = "getPublicKeysJson";

/// Source of DID public key documents.
pub trait DidRegistry {
    /// Raw JSON array of [`DidPubkey`] records registered for `did`.
    fn public_keys_json(&self, did: &str) -> Result<Vec<u8>>;
}

impl<T: DidRegistry + ?Sized> DidRegistry for &T {
    fn public_keys_json(&self, did: &str) -> Result<Vec<u8>> {
        (**self).public_keys_json(did)
    }
}

/// One public key entry of a DID document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidPubkey {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub controller: serde_json::Value,
    #[serde(rename = "publicKeyHex")]
    pub public_key_hex: String,
}

/// Looks up `did` and returns the raw bytes of its first registered key.
pub fn resolve_public_key<R: DidRegistry + ?Sized>(registry: &R, did: &str) -> Result<Vec<u8>> {
    let document = registry.public_keys_json(did)?;

    // An unregistered DID may come back as `null`.
    let keys: Option<Vec<DidPubkey>> = serde_json::from_slice(&document)
        .map_err(|e| ProviderError::MalformedRegistryResponse(e.to_string()))?;
    let keys = keys.unwrap_or_default();

    let first = keys
        .first()
        .ok_or_else(|| ProviderError::DidNotFound(did.to_string()))?;
    tracing::debug!(did, key_id = %first.id, keys = keys.len(), "resolved DID public key");

    hex::decode(&first.public_key_hex).map_err(|e| {
        ProviderError::MalformedRegistryResponse(format!("publicKeyHex of {}: {}", first.id, e))
    })
}

/// In-memory registry.
///
/// Unknown DIDs resolve to an empty key list.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    documents: HashMap<String, Vec<u8>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw JSON document, valid or not.
    pub fn insert_json(&mut self, did: impl Into<String>, json: impl Into<Vec<u8>>) {
        self.documents.insert(did.into(), json.into());
    }

    pub fn insert_keys(&mut self, did: impl Into<String>, keys: &[DidPubkey]) -> Result<()> {
        let json = serde_json::to_vec(keys)
            .map_err(|e| ProviderError::Registry(format!("Failed to encode keys: {}", e)))?;
        self.insert_json(did, json);
        Ok(())
    }

    /// Registers `public_key` as the DID's only key, in the shape ONT ID returns.
    pub fn with_public_key(mut self, did: impl Into<String>, public_key: &[u8]) -> Self {
        let did = did.into();
        let document = serde_json::json!([{
            "id": format!("{}#keys-1", did),
            "type": "EcdsaSecp256r1VerificationKey2019",
            "controller": did,
            "publicKeyHex": hex::encode(public_key),
        }]);
        self.insert_json(did, document.to_string());
        self
    }
}

impl DidRegistry for StaticRegistry {
    fn public_keys_json(&self, did: &str) -> Result<Vec<u8>> {
        Ok(self
            .documents
            .get(did)
            .cloned()
            .unwrap_or_else(|| b"[]".to_vec()))
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: serde_json::Value,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    error: i64,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PreExecResult {
    state: u8,
    #[serde(default)]
    gas: u64,
    #[serde(default)]
    result: serde_json::Value,
}

/// Registry backed by an Ontology node's JSON-RPC interface.
#[derive(Debug, Clone)]
pub struct RpcRegistry {
    address: String,
    agent: ureq::Agent,
}

impl RpcRegistry {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            address: address.into(),
            agent,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.rpc_address(), config.timeout)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Runs a transaction on the node without committing it.
    fn pre_execute(&self, tx: &InvokeTransaction) -> Result<RpcResponse> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "sendrawtransaction",
            params: serde_json::json!([hex::encode(tx.serialize()), 1]),
            id: 1,
        };

        tracing::debug!(rpc = %self.address, "pre-executing registry query");
        let response = self
            .agent
            .post(&self.address)
            .send_json(&request)
            .map_err(|e| ProviderError::Registry(format!("RPC request failed: {}", e)))?;

        response
            .into_json::<RpcResponse>()
            .map_err(|e| ProviderError::Registry(format!("Invalid RPC response: {}", e)))
    }
}

impl DidRegistry for RpcRegistry {
    fn public_keys_json(&self, did: &str) -> Result<Vec<u8>> {
        let code = build_native_invoke_code(
            &ONT_ID_CONTRACT,
            ONT_ID_CONTRACT_VERSION,
            GET_PUBLIC_KEYS_METHOD,
            &[did.as_bytes()],
        );
        let response = self.pre_execute(&InvokeTransaction::pre_exec(code))?;
        pre_exec_payload(response)
    }
}

/// Extracts the returned bytes from a pre-exec response.
fn pre_exec_payload(response: RpcResponse) -> Result<Vec<u8>> {
    if response.error != 0 {
        return Err(ProviderError::Registry(format!(
            "node returned error {}: {}",
            response.error, response.desc
        )));
    }

    let result: PreExecResult = serde_json::from_value(response.result)
        .map_err(|e| ProviderError::MalformedRegistryResponse(e.to_string()))?;
    if result.state == 0 {
        return Err(ProviderError::Registry(
            "contract execution failed".to_string(),
        ));
    }
    tracing::debug!(gas = result.gas, "registry query executed");

    let hex_result = result.result.as_str().ok_or_else(|| {
        ProviderError::MalformedRegistryResponse("result is not a byte array".to_string())
    })?;
    hex::decode(hex_result).map_err(|e| ProviderError::MalformedRegistryResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "did:ont:AFmseVrdL9f9oyCzZefL9tG6UbvhUMqNMV";

    fn response(json: &str) -> RpcResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resolve_first_key() {
        let mut registry = StaticRegistry::new();
        registry.insert_json(
            DID,
            r#"[
                {"id": "k1", "type": "EcdsaSecp256r1VerificationKey2019", "controller": "c", "publicKeyHex": "02aa"},
                {"id": "k2", "type": "EcdsaSecp256r1VerificationKey2019", "controller": "c", "publicKeyHex": "03bb"}
            ]"#,
        );

        assert_eq!(resolve_public_key(&registry, DID).unwrap(), vec![0x02, 0xaa]);
    }

    #[test]
    fn test_resolve_empty_is_not_found() {
        let mut registry = StaticRegistry::new();
        registry.insert_json(DID, "[]");
        assert!(matches!(
            resolve_public_key(&registry, DID),
            Err(ProviderError::DidNotFound(ref d)) if d == DID
        ));

        registry.insert_json(DID, "null");
        assert!(matches!(
            resolve_public_key(&registry, DID),
            Err(ProviderError::DidNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_did_is_not_found() {
        let registry = StaticRegistry::new();
        assert!(matches!(
            resolve_public_key(&registry, "did:ont:unknown"),
            Err(ProviderError::DidNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_documents() {
        let mut registry = StaticRegistry::new();

        registry.insert_json(DID, "{not json");
        assert!(matches!(
            resolve_public_key(&registry, DID),
            Err(ProviderError::MalformedRegistryResponse(_))
        ));

        registry.insert_json(
            DID,
            r#"[{"id": "k1", "type": "t", "controller": null, "publicKeyHex": "zz"}]"#,
        );
        assert!(matches!(
            resolve_public_key(&registry, DID),
            Err(ProviderError::MalformedRegistryResponse(_))
        ));
    }

    #[test]
    fn test_with_public_key_document_shape() {
        let registry = StaticRegistry::new().with_public_key(DID, &[0x02, 0x01]);
        let json = registry.public_keys_json(DID).unwrap();
        let keys: Vec<DidPubkey> = serde_json::from_slice(&json).unwrap();

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id, format!("{}#keys-1", DID));
        assert_eq!(keys[0].controller, serde_json::json!(DID));
        assert_eq!(keys[0].public_key_hex, "0201");
    }

    #[test]
    fn test_insert_keys() {
        let mut registry = StaticRegistry::new();
        let key = DidPubkey {
            id: "k1".to_string(),
            key_type: "t".to_string(),
            controller: serde_json::Value::Null,
            public_key_hex: "03ff".to_string(),
        };
        registry.insert_keys(DID, &[key]).unwrap();
        assert_eq!(resolve_public_key(&registry, DID).unwrap(), vec![0x03, 0xff]);
    }

    #[test]
    fn test_pre_exec_payload_success() {
        let payload = hex::encode(br#"[{"id":"k"}]"#);
        let json = format!(
            r#"{{"desc":"SUCCESS","error":0,"id":1,"jsonrpc":"2.0","result":{{"State":1,"Gas":20000,"Result":"{}","Notify":[]}}}}"#,
            payload
        );
        assert_eq!(
            pre_exec_payload(response(&json)).unwrap(),
            br#"[{"id":"k"}]"#.to_vec()
        );
    }

    #[test]
    fn test_pre_exec_payload_node_error() {
        let resp = response(r#"{"desc":"INVALID PARAMS","error":42002,"result":""}"#);
        assert!(matches!(
            pre_exec_payload(resp),
            Err(ProviderError::Registry(ref msg)) if msg.contains("42002")
        ));
    }

    #[test]
    fn test_pre_exec_payload_failed_state() {
        let resp = response(r#"{"error":0,"result":{"State":0,"Gas":0,"Result":""}}"#);
        assert!(matches!(
            pre_exec_payload(resp),
            Err(ProviderError::Registry(_))
        ));
    }

    #[test]
    fn test_pre_exec_payload_non_string_result() {
        let resp = response(r#"{"error":0,"result":{"State":1,"Result":[1,2]}}"#);
        assert!(matches!(
            pre_exec_payload(resp),
            Err(ProviderError::MalformedRegistryResponse(_))
        ));
    }

    #[test]
    fn test_unreachable_node_is_registry_error() {
        let registry = RpcRegistry::new("http://127.0.0.1:1", Duration::from_millis(200));
        assert!(matches!(
            registry.public_keys_json(DID),
            Err(ProviderError::Registry(_))
        ));
    }
}
