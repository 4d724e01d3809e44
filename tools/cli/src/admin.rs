use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::info;
use serde_json::{json, Value};

use crate::error::{ClientError, PreconditionError};
use crate::gateway::{ContractGateway, Receipt};
use crate::utils::validate_address;

/// Owner-only contract operations, one variant per gateway write.
#[derive(Debug, Clone)]
pub enum AdminOp {
    AddAuthorizedHospital { address: String, name: String },
    AddAuthorizedCompany { address: String, name: String },
    AddAuthorizedAiOracle { address: String },
    TransferOwnership { new_owner: String },
    PauseContract,
    UnpauseContract,
    EmergencyWithdraw,
}

impl AdminOp {
    pub fn method(&self) -> &'static str {
        match self {
            AdminOp::AddAuthorizedHospital { .. } => "addAuthorizedHospital",
            AdminOp::AddAuthorizedCompany { .. } => "addAuthorizedCompany",
            AdminOp::AddAuthorizedAiOracle { .. } => "addAuthorizedAiOracle",
            AdminOp::TransferOwnership { .. } => "transferOwnership",
            AdminOp::PauseContract => "pauseContract",
            AdminOp::UnpauseContract => "unpauseContract",
            AdminOp::EmergencyWithdraw => "emergencyWithdraw",
        }
    }

    fn args(&self) -> Vec<Value> {
        match self {
            AdminOp::AddAuthorizedHospital { address, name }
            | AdminOp::AddAuthorizedCompany { address, name } => {
                vec![json!(address), json!(name)]
            }
            AdminOp::AddAuthorizedAiOracle { address } => vec![json!(address)],
            AdminOp::TransferOwnership { new_owner } => vec![json!(new_owner)],
            AdminOp::PauseContract | AdminOp::UnpauseContract | AdminOp::EmergencyWithdraw => {
                vec![]
            }
        }
    }

    fn address_param(&self) -> Option<&str> {
        match self {
            AdminOp::AddAuthorizedHospital { address, .. }
            | AdminOp::AddAuthorizedCompany { address, .. }
            | AdminOp::AddAuthorizedAiOracle { address } => Some(address),
            AdminOp::TransferOwnership { new_owner } => Some(new_owner),
            _ => None,
        }
    }
}

/// Call-and-wait wrapper around the admin writes. A per-operation busy flag
/// refuses double submission of the same operation; distinct operations may
/// run concurrently.
pub struct AdminDispatcher<G> {
    gateway: Arc<G>,
    busy: Mutex<HashSet<&'static str>>,
}

impl<G: ContractGateway> AdminDispatcher<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            busy: Mutex::new(HashSet::new()),
        }
    }

    pub async fn dispatch(&self, op: AdminOp) -> Result<Receipt, ClientError> {
        if let Some(address) = op.address_param() {
            validate_address(address)
                .map_err(|e| PreconditionError::InvalidAddress(e.to_string()))?;
        }

        let method = op.method();
        {
            let mut busy = self.busy.lock().unwrap();
            if !busy.insert(method) {
                return Err(PreconditionError::OperationBusy(method.to_string()).into());
            }
        }

        let result = self.gateway.admin_call(method, op.args()).await;
        self.busy.lock().unwrap().remove(method);

        let receipt = result?;
        if !receipt.success {
            let message = receipt
                .error
                .unwrap_or_else(|| "transaction receipt reported failure".to_string());
            return Err(ClientError::Transaction(message));
        }
        info!("{} completed in {}", method, receipt.tx_hash);
        Ok(receipt)
    }
}
