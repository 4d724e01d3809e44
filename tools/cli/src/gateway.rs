use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::claim::{ClaimRecord, ClaimType, PartyRecord};
use crate::error::ClientError;

/// Outcome of a write, as reported by the transaction receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub tx_hash: String,
    pub success: bool,
    /// Identifier emitted by the contract, e.g. the id assigned to a newly
    /// submitted claim.
    pub claim_id: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubmitClaimParams {
    /// Smallest-unit integer string.
    pub amount: String,
    pub document_hash: String,
    pub claim_type: ClaimType,
    pub hospital: String,
    pub oracle: String,
}

/// Read and write surface of the claims contract. Reads return current field
/// values; writes resolve once a receipt is available, success or failure.
#[allow(async_fn_in_trait)]
pub trait ContractGateway {
    async fn claim(&self, id: u64) -> Result<ClaimRecord, ClientError>;
    async fn total_claims(&self) -> Result<u64, ClientError>;
    async fn hospital(&self, address: &str) -> Result<PartyRecord, ClientError>;
    async fn company(&self, address: &str) -> Result<PartyRecord, ClientError>;
    async fn is_authorized_hospital(&self, address: &str) -> Result<bool, ClientError>;
    async fn is_authorized_company(&self, address: &str) -> Result<bool, ClientError>;
    async fn submit_claim(&self, params: &SubmitClaimParams) -> Result<Receipt, ClientError>;
    async fn verify_claim_by_hospital(&self, claim_id: u64) -> Result<Receipt, ClientError>;
    async fn verify_claim_by_company(&self, claim_id: u64) -> Result<Receipt, ClientError>;
    async fn admin_call(&self, method: &str, args: Vec<Value>) -> Result<Receipt, ClientError>;
}

/// Account that signs writes. The key never leaves the request headers; the
/// gateway daemon holds the actual wallet.
#[derive(Debug, Clone)]
pub struct Signer {
    pub address: String,
    pub secret_key: String,
}

/// HTTP gateway client. Reads go to `POST {rpc_url}/call`, writes to
/// `POST {rpc_url}/invoke` followed by receipt polling. There is no
/// client-side timeout: a transaction that never completes keeps the caller
/// waiting, matching the absence of cancellation once dispatched.
#[derive(Debug)]
pub struct HttpGateway {
    rpc_url: String,
    contract: String,
    signer: Option<Signer>,
    poll_interval: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    ok: bool,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReceiptResponse {
    status: String,
    #[serde(default)]
    claim_id: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a gateway error envelope onto the client taxonomy.
fn classify(code: Option<&str>, message: String, write: bool) -> ClientError {
    match code {
        Some("unauthorized") => ClientError::Authorization(message),
        Some("rejected") | Some("reverted") | Some("insufficient_funds") => {
            ClientError::Transaction(message)
        }
        _ if write => ClientError::Transaction(message),
        _ => ClientError::Connectivity(message),
    }
}

impl HttpGateway {
    pub fn new(rpc_url: &str, contract: &str, signer: Option<Signer>) -> Self {
        Self {
            rpc_url: rpc_url.trim_end_matches('/').to_string(),
            contract: contract.to_string(),
            signer,
            poll_interval: Duration::from_secs(2),
            client: reqwest::Client::new(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn signer_address(&self) -> Option<&str> {
        self.signer.as_ref().map(|s| s.address.as_str())
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, ClientError> {
        debug!("call {} on {}", method, self.contract);
        let payload = json!({
            "contract": self.contract,
            "method": method,
            "args": args,
        });

        let response = self
            .client
            .post(format!("{}/call", self.rpc_url))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body: CallResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Connectivity(format!("malformed gateway response: {}", e)))?;

        if !body.ok {
            let message = body
                .error
                .unwrap_or_else(|| format!("gateway returned {}", status));
            return Err(classify(body.code.as_deref(), message, false));
        }
        serde_json::from_value(body.result)
            .map_err(|e| ClientError::Connectivity(format!("malformed {} result: {}", method, e)))
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Receipt, ClientError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ClientError::Connectivity(
                "no signer configured; set MEDISURE_SECRET_KEY or add [auth] to the config file"
                    .to_string(),
            )
        })?;

        let request_id = Uuid::new_v4().to_string();
        debug!("invoke {} request_id={}", method, request_id);
        let payload = json!({
            "contract": self.contract,
            "method": method,
            "args": args,
            "signer": signer.address,
            "request_id": request_id,
        });

        let response = self
            .client
            .post(format!("{}/invoke", self.rpc_url))
            .header("x-signer-key", &signer.secret_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body: InvokeResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Connectivity(format!("malformed gateway response: {}", e)))?;

        if !body.ok {
            let message = body
                .error
                .unwrap_or_else(|| format!("gateway returned {}", status));
            return Err(classify(body.code.as_deref(), message, true));
        }
        let tx_hash = body.tx_hash.ok_or_else(|| {
            ClientError::Connectivity("gateway accepted the transaction but returned no hash".to_string())
        })?;

        self.wait_for_receipt(&tx_hash).await
    }

    /// Poll until the transaction leaves the pending state. Unbounded on
    /// purpose: cancellation after dispatch is not supported.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<Receipt, ClientError> {
        loop {
            let response = self
                .client
                .get(format!("{}/receipt/{}", self.rpc_url, tx_hash))
                .send()
                .await?;
            let body: ReceiptResponse = response.json().await.map_err(|e| {
                ClientError::Connectivity(format!("malformed receipt response: {}", e))
            })?;

            if body.status == "pending" {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            debug!("receipt for {}: {}", tx_hash, body.status);
            return Ok(Receipt {
                tx_hash: tx_hash.to_string(),
                success: body.status == "success",
                claim_id: body.claim_id,
                error: body.error,
            });
        }
    }
}

impl ContractGateway for HttpGateway {
    async fn claim(&self, id: u64) -> Result<ClaimRecord, ClientError> {
        self.call("claims", vec![json!(id)]).await
    }

    async fn total_claims(&self) -> Result<u64, ClientError> {
        self.call("totalClaims", vec![]).await
    }

    async fn hospital(&self, address: &str) -> Result<PartyRecord, ClientError> {
        self.call("hospitals", vec![json!(address)]).await
    }

    async fn company(&self, address: &str) -> Result<PartyRecord, ClientError> {
        self.call("companies", vec![json!(address)]).await
    }

    async fn is_authorized_hospital(&self, address: &str) -> Result<bool, ClientError> {
        self.call("authorizedHospitals", vec![json!(address)]).await
    }

    async fn is_authorized_company(&self, address: &str) -> Result<bool, ClientError> {
        self.call("authorizedCompanies", vec![json!(address)]).await
    }

    async fn submit_claim(&self, params: &SubmitClaimParams) -> Result<Receipt, ClientError> {
        self.invoke(
            "submitClaim",
            vec![
                json!(params.amount),
                json!(params.document_hash),
                json!(u8::from(params.claim_type)),
                json!(params.hospital),
                json!(params.oracle),
            ],
        )
        .await
    }

    async fn verify_claim_by_hospital(&self, claim_id: u64) -> Result<Receipt, ClientError> {
        self.invoke("verifyClaimByHospital", vec![json!(claim_id)]).await
    }

    async fn verify_claim_by_company(&self, claim_id: u64) -> Result<Receipt, ClientError> {
        self.invoke("verifyClaimByCompany", vec![json!(claim_id)]).await
    }

    async fn admin_call(&self, method: &str, args: Vec<Value>) -> Result<Receipt, ClientError> {
        self.invoke(method, args).await
    }
}
