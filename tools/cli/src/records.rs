use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Bills,
    DoctorReports,
    TestReports,
    PolicyDocuments,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Bills => "bills",
            DocumentType::DoctorReports => "doctor-reports",
            DocumentType::TestReports => "test-reports",
            DocumentType::PolicyDocuments => "policy-documents",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A pinned claim form payload.
    Form,
    /// A pinned supporting document.
    Document,
}

/// One successful upload, as remembered on this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    pub name: String,
    pub content_hash: String,
    pub url: String,
    pub size: u64,
    pub timestamp: DateTime<Utc>,
    /// Connected account at upload time, when one was configured. The store
    /// itself is per machine profile, not per wallet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
}

/// Append-only list of upload records in a local JSON file. No dedup, no
/// versioning; the records command reads it back as-is.
pub struct UploadRecorder {
    path: PathBuf,
}

impl UploadRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Result<Vec<UploadRecord>, ClientError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ClientError::Upload(format!(
                    "record store at {} is corrupt: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ClientError::Upload(format!(
                "cannot read record store at {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    pub async fn append(&self, record: UploadRecord) -> Result<(), ClientError> {
        let mut records = self.list().await?;
        records.push(record);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ClientError::Upload(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| ClientError::Upload(e.to_string()))?;
        fs::write(&self.path, content).await.map_err(|e| {
            ClientError::Upload(format!(
                "cannot write record store at {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> UploadRecord {
        UploadRecord {
            kind: RecordKind::Document,
            document_type: Some(DocumentType::Bills),
            name: name.to_string(),
            content_hash: "QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u".to_string(),
            url: "https://gateway.pinata.cloud/ipfs/QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u"
                .to_string(),
            size: 1024,
            timestamp: Utc::now(),
            wallet: None,
        }
    }

    #[tokio::test]
    async fn missing_store_lists_as_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let recorder = UploadRecorder::new(dir.path().join("records.json"));
        assert!(recorder.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_list_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let recorder = UploadRecorder::new(dir.path().join("nested").join("records.json"));

        recorder.append(sample("bill.pdf")).await.unwrap();
        recorder.append(sample("scan.png")).await.unwrap();

        let records = recorder.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "bill.pdf");
        assert_eq!(records[1].name, "scan.png");
        assert_eq!(records[0].document_type, Some(DocumentType::Bills));
    }

    #[tokio::test]
    async fn corrupt_store_is_reported_not_swallowed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "{{not json").unwrap();

        let recorder = UploadRecorder::new(&path);
        assert!(matches!(
            recorder.list().await.unwrap_err(),
            ClientError::Upload(_)
        ));
    }
}
