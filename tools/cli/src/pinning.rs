use std::path::Path;

use chrono::Utc;
use log::info;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;
use tokio::fs;

use crate::error::ClientError;
use crate::records::DocumentType;

/// Uploads larger than this are refused before any request is made.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Client for the content-addressed pinning service. Files and JSON payloads
/// go up, a content hash comes back.
pub struct PinningClient {
    api_url: String,
    gateway_url: String,
    api_key: String,
    secret_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[derive(Debug, Clone)]
pub struct Pinned {
    pub hash: String,
    /// Retrieval URL on the public gateway.
    pub url: String,
}

impl PinningClient {
    pub fn new(api_url: &str, gateway_url: &str, api_key: &str, secret_key: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn pin_file(
        &self,
        path: &Path,
        document_type: DocumentType,
    ) -> Result<Pinned, ClientError> {
        let meta = fs::metadata(path)
            .await
            .map_err(|e| ClientError::Upload(format!("cannot read {}: {}", path.display(), e)))?;
        if meta.len() > MAX_UPLOAD_BYTES {
            return Err(ClientError::Upload(format!(
                "{} exceeds the 10 MiB upload limit",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let bytes = fs::read(path)
            .await
            .map_err(|e| ClientError::Upload(format!("cannot read {}: {}", path.display(), e)))?;

        let metadata = json!({
            "name": name,
            "keyvalues": {
                "type": document_type.as_str(),
                "uploadDate": Utc::now().to_rfc3339(),
            },
        });
        let options = json!({ "cidVersion": 1, "wrapWithDirectory": false });
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(name.clone()))
            .text("pinataMetadata", metadata.to_string())
            .text("pinataOptions", options.to_string());

        info!("pinning {} ({} bytes)", name, meta.len());
        let response = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Upload(e.to_string()))?;
        self.finish(response).await
    }

    pub async fn pin_json(&self, content: &serde_json::Value) -> Result<Pinned, ClientError> {
        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
            .json(&json!({ "pinataContent": content }))
            .send()
            .await
            .map_err(|e| ClientError::Upload(e.to_string()))?;
        self.finish(response).await
    }

    async fn finish(&self, response: reqwest::Response) -> Result<Pinned, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upload(format!(
                "pinning service returned {}: {}",
                status, body
            )));
        }
        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Upload(format!("malformed pinning response: {}", e)))?;
        Ok(Pinned {
            url: format!("{}/ipfs/{}", self.gateway_url, body.ipfs_hash),
            hash: body.ipfs_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PinningClient {
        PinningClient::new(
            "https://api.pinata.cloud/",
            "https://gateway.pinata.cloud/",
            "key",
            "secret",
        )
    }

    #[tokio::test]
    async fn oversized_files_are_refused_before_any_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("huge.bin");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES + 1).unwrap();

        let err = client()
            .pin_file(&path, DocumentType::Bills)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Upload(_)));
        assert!(err.to_string().contains("10 MiB"));
    }

    #[tokio::test]
    async fn missing_file_is_an_upload_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = client()
            .pin_file(&dir.path().join("absent.pdf"), DocumentType::TestReports)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Upload(_)));
    }

    #[test]
    fn pin_response_parses_the_service_shape() {
        let body: PinResponse =
            serde_json::from_str(r#"{"IpfsHash":"QmX","PinSize":123,"Timestamp":"t"}"#).unwrap();
        assert_eq!(body.ipfs_hash, "QmX");
    }
}
