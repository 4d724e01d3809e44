use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw claim record as returned by the contract gateway. Identity fields are
/// immutable after submission; only the two verification flags and the status
/// code ever change, each set by its designated party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub claim_id: u64,
    pub claimant: String,
    /// Amount in the smallest on-chain unit, as a decimal string. Kept as a
    /// string because the source integer is 256-bit and must not lose
    /// precision.
    pub claim_amount: String,
    /// Unix seconds.
    pub submission_time: u64,
    /// Content hash of the supporting documents.
    pub ipfs_hash: String,
    pub claim_type: ClaimType,
    pub assigned_hospital: String,
    pub assigned_company: String,
    pub assigned_oracle: String,
    pub hospital_verified: bool,
    pub company_verified: bool,
    /// Raw status code; unknown codes are tolerated and rendered as such.
    pub status: u8,
}

/// Hospital or company record, plus the separately stored authorization flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRecord {
    pub address: String,
    pub name: String,
    pub is_active: bool,
    pub total_verifications: u64,
    /// Unix seconds; zero means the party has never verified a claim.
    pub last_verification_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClaimType {
    Medical,
    Accident,
    Life,
    Senior,
    Other,
}

impl From<ClaimType> for u8 {
    fn from(t: ClaimType) -> u8 {
        match t {
            ClaimType::Medical => 0,
            ClaimType::Accident => 1,
            ClaimType::Life => 2,
            ClaimType::Senior => 3,
            ClaimType::Other => 4,
        }
    }
}

impl TryFrom<u8> for ClaimType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ClaimType::Medical),
            1 => Ok(ClaimType::Accident),
            2 => Ok(ClaimType::Life),
            3 => Ok(ClaimType::Senior),
            4 => Ok(ClaimType::Other),
            other => Err(format!("unknown claim type code: {}", other)),
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClaimType::Medical => "Medical",
            ClaimType::Accident => "Accident",
            ClaimType::Life => "Life",
            ClaimType::Senior => "Senior",
            ClaimType::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Claim lifecycle status. `Disputed` is reserved: the gateway may report it
/// but no client action sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    Pending,
    Verified,
    Rejected,
    Disputed,
    Unknown,
}

impl ClaimStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ClaimStatus::Pending,
            1 => ClaimStatus::Verified,
            2 => ClaimStatus::Rejected,
            3 => ClaimStatus::Disputed,
            _ => ClaimStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Verified => "Verified",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Disputed => "Disputed",
            ClaimStatus::Unknown => "Unknown",
        }
    }
}

/// Viewing role a dashboard is parameterized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Hospital,
    Company,
    Claimant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Hospital => "hospital",
            Role::Company => "company",
            Role::Claimant => "claimant",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_type_round_trips_through_codes() {
        for t in [
            ClaimType::Medical,
            ClaimType::Accident,
            ClaimType::Life,
            ClaimType::Senior,
            ClaimType::Other,
        ] {
            assert_eq!(ClaimType::try_from(u8::from(t)).unwrap(), t);
        }
        assert!(ClaimType::try_from(5).is_err());
    }

    #[test]
    fn unknown_status_codes_do_not_fail() {
        assert_eq!(ClaimStatus::from_code(0), ClaimStatus::Pending);
        assert_eq!(ClaimStatus::from_code(3), ClaimStatus::Disputed);
        assert_eq!(ClaimStatus::from_code(42), ClaimStatus::Unknown);
        assert_eq!(ClaimStatus::from_code(42).label(), "Unknown");
    }

    #[test]
    fn claim_record_deserializes_from_gateway_json() {
        let raw = serde_json::json!({
            "claimId": 42,
            "claimant": "0x1111111111111111111111111111111111111111",
            "claimAmount": "1500000000000000000",
            "submissionTime": 1_700_000_000u64,
            "ipfsHash": "QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u",
            "claimType": 0,
            "assignedHospital": "0x2222222222222222222222222222222222222222",
            "assignedCompany": "0x3333333333333333333333333333333333333333",
            "assignedOracle": "0x4444444444444444444444444444444444444444",
            "hospitalVerified": false,
            "companyVerified": false,
            "status": 0
        });
        let claim: ClaimRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(claim.claim_id, 42);
        assert_eq!(claim.claim_type, ClaimType::Medical);
        assert_eq!(claim.claim_amount, "1500000000000000000");
    }
}
