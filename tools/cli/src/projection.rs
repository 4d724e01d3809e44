use serde::Serialize;

use crate::claim::{ClaimRecord, ClaimStatus, PartyRecord, Role};
use crate::error::ClientError;
use crate::utils::{format_timestamp, format_units, truncate_address, AMOUNT_DECIMALS};

/// Display-ready view of a claim, derived once per fetch and shared by every
/// role dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimView {
    pub id: u64,
    pub claimant_short: String,
    pub amount_display: String,
    pub date_display: String,
    pub hospital_verified: bool,
    pub company_verified: bool,
    pub status_label: &'static str,
    /// Whether the projecting role's verification action is currently
    /// allowed on this claim.
    pub can_verify: bool,
}

/// Project a raw claim into its display form for the given role. Pure; the
/// only failure is a malformed amount coming back from the gateway.
pub fn project(claim: &ClaimRecord, role: Role) -> Result<ClaimView, ClientError> {
    let amount_display = format_units(&claim.claim_amount, AMOUNT_DECIMALS).map_err(|e| {
        ClientError::Connectivity(format!("claim {}: {}", claim.claim_id, e))
    })?;

    let can_verify = match role {
        Role::Hospital => !claim.hospital_verified,
        Role::Company => claim.hospital_verified && !claim.company_verified,
        Role::Admin | Role::Claimant => false,
    };

    Ok(ClaimView {
        id: claim.claim_id,
        claimant_short: truncate_address(&claim.claimant),
        amount_display,
        date_display: format_timestamp(claim.submission_time),
        hospital_verified: claim.hospital_verified,
        company_verified: claim.company_verified,
        status_label: ClaimStatus::from_code(claim.status).label(),
        can_verify,
    })
}

/// Profile card data for a hospital or company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyView {
    pub name: String,
    pub active: bool,
    pub status_label: &'static str,
    pub total_verifications: u64,
    pub last_verification: String,
}

/// A party counts as active only when its own flag and the admin-granted
/// authorization both hold.
pub fn project_party(party: &PartyRecord, authorized: bool) -> PartyView {
    let active = party.is_active && authorized;
    PartyView {
        name: if party.name.is_empty() {
            "Unknown".to_string()
        } else {
            party.name.clone()
        },
        active,
        status_label: if active { "Active" } else { "Inactive" },
        total_verifications: party.total_verifications,
        last_verification: format_timestamp(party.last_verification_time),
    }
}
