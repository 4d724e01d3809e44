//! In-memory gateway used by the state-machine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::Notify;

use crate::claim::{ClaimRecord, ClaimType, PartyRecord};
use crate::error::ClientError;
use crate::gateway::{ContractGateway, Receipt, SubmitClaimParams};

pub const CLAIMANT: &str = "0x1111111111111111111111111111111111111111";
pub const HOSPITAL: &str = "0x2222222222222222222222222222222222222222";
pub const COMPANY: &str = "0x3333333333333333333333333333333333333333";
pub const ORACLE: &str = "0x4444444444444444444444444444444444444444";

pub fn claim(id: u64, hospital_verified: bool, company_verified: bool) -> ClaimRecord {
    ClaimRecord {
        claim_id: id,
        claimant: CLAIMANT.to_string(),
        claim_amount: "1500000000000000000".to_string(),
        submission_time: 1_700_000_000,
        ipfs_hash: "QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u".to_string(),
        claim_type: ClaimType::Medical,
        assigned_hospital: HOSPITAL.to_string(),
        assigned_company: COMPANY.to_string(),
        assigned_oracle: ORACLE.to_string(),
        hospital_verified,
        company_verified,
        status: 0,
    }
}

/// Gateway double backed by a claim map. Writes mutate the map the way the
/// contract would; a gate lets tests hold a write in flight.
pub struct MockGateway {
    pub claims: Mutex<HashMap<u64, ClaimRecord>>,
    pub read_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    write_gate: Option<Notify>,
    fail_writes: AtomicBool,
}

impl MockGateway {
    pub fn with_claims(claims: Vec<ClaimRecord>) -> Self {
        Self {
            claims: Mutex::new(claims.into_iter().map(|c| (c.claim_id, c)).collect()),
            read_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            write_gate: None,
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Like [`with_claims`], but every write parks until [`release_write`]
    /// is called.
    pub fn gated(claims: Vec<ClaimRecord>) -> Self {
        Self {
            write_gate: Some(Notify::new()),
            ..Self::with_claims(claims)
        }
    }

    pub fn release_write(&self) {
        if let Some(gate) = &self.write_gate {
            gate.notify_one();
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    async fn write<F>(&self, apply: F) -> Result<Receipt, ClientError>
    where
        F: FnOnce(&mut HashMap<u64, ClaimRecord>) -> Option<u64>,
    {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Ok(Receipt {
                tx_hash: "0xmock".to_string(),
                success: false,
                claim_id: None,
                error: Some("execution reverted".to_string()),
            });
        }
        let claim_id = apply(&mut self.claims.lock().unwrap());
        Ok(Receipt {
            tx_hash: "0xmock".to_string(),
            success: true,
            claim_id,
            error: None,
        })
    }
}

impl ContractGateway for MockGateway {
    async fn claim(&self, id: u64) -> Result<ClaimRecord, ClientError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.claims
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::Connectivity(format!("claim {} not found", id)))
    }

    async fn total_claims(&self) -> Result<u64, ClientError> {
        Ok(self.claims.lock().unwrap().len() as u64)
    }

    async fn hospital(&self, address: &str) -> Result<PartyRecord, ClientError> {
        Ok(PartyRecord {
            address: address.to_string(),
            name: "Mock Hospital".to_string(),
            is_active: true,
            total_verifications: 0,
            last_verification_time: 0,
        })
    }

    async fn company(&self, address: &str) -> Result<PartyRecord, ClientError> {
        Ok(PartyRecord {
            address: address.to_string(),
            name: "Mock Company".to_string(),
            is_active: true,
            total_verifications: 0,
            last_verification_time: 0,
        })
    }

    async fn is_authorized_hospital(&self, _address: &str) -> Result<bool, ClientError> {
        Ok(true)
    }

    async fn is_authorized_company(&self, _address: &str) -> Result<bool, ClientError> {
        Ok(true)
    }

    async fn submit_claim(&self, params: &SubmitClaimParams) -> Result<Receipt, ClientError> {
        let amount = params.amount.clone();
        self.write(move |claims| {
            let id = claims.len() as u64;
            let mut record = claim(id, false, false);
            record.claim_amount = amount;
            claims.insert(id, record);
            Some(id)
        })
        .await
    }

    async fn verify_claim_by_hospital(&self, claim_id: u64) -> Result<Receipt, ClientError> {
        self.write(move |claims| {
            if let Some(c) = claims.get_mut(&claim_id) {
                c.hospital_verified = true;
            }
            None
        })
        .await
    }

    async fn verify_claim_by_company(&self, claim_id: u64) -> Result<Receipt, ClientError> {
        self.write(move |claims| {
            if let Some(c) = claims.get_mut(&claim_id) {
                c.company_verified = true;
                if c.hospital_verified {
                    c.status = 1;
                }
            }
            None
        })
        .await
    }

    async fn admin_call(&self, _method: &str, _args: Vec<Value>) -> Result<Receipt, ClientError> {
        self.write(|_| None).await
    }
}
