use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use log::debug;
use serde::Serialize;

use crate::claim::{ClaimRecord, Role};
use crate::error::{ClientError, PreconditionError};
use crate::gateway::ContractGateway;
use crate::projection::{project, ClaimView};

/// A claim the dashboard has successfully read: the raw record plus its
/// projection for this dashboard's role.
#[derive(Debug, Clone)]
pub struct LoadedClaim {
    pub record: ClaimRecord,
    pub view: ClaimView,
}

/// Per-claim lifecycle within one dashboard instance.
#[derive(Debug, Clone, Default)]
pub enum ClaimState {
    #[default]
    Idle,
    Loading,
    Loaded(LoadedClaim),
    Submitting(LoadedClaim),
    /// A read or write went wrong. The last good projection is kept so a
    /// failure never wipes what the user was looking at.
    Failed {
        message: String,
        last: Option<LoadedClaim>,
    },
}

impl ClaimState {
    fn loaded(&self) -> Option<&LoadedClaim> {
        match self {
            ClaimState::Loaded(l) => Some(l),
            ClaimState::Failed { last: Some(l), .. } => Some(l),
            _ => None,
        }
    }
}

/// Claims assigned to the viewing party, split by whether this role has
/// already verified them.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedClaims {
    pub pending: Vec<ClaimView>,
    pub verified: Vec<ClaimView>,
}

/// One role's view of the claim store: read, project, verify. All four role
/// dashboards share this machine; the role parameter selects the gateway
/// write and the guard flags.
pub struct ClaimDashboard<G> {
    role: Role,
    viewer: String,
    gateway: Arc<G>,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    claims: HashMap<u64, ClaimState>,
    /// Claims with a write currently dispatched. At most one write per claim
    /// per dashboard instance.
    in_flight: HashSet<u64>,
}

impl<G: ContractGateway> ClaimDashboard<G> {
    pub fn new(role: Role, viewer: &str, gateway: Arc<G>) -> Self {
        Self {
            role,
            viewer: viewer.to_string(),
            gateway,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Current state of a claim, `Idle` if it was never requested.
    pub fn state(&self, claim_id: u64) -> ClaimState {
        self.inner
            .lock()
            .unwrap()
            .claims
            .get(&claim_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn fetch(&self, claim_id: u64) -> Result<LoadedClaim, ClientError> {
        let record = self.gateway.claim(claim_id).await?;
        let view = project(&record, self.role)?;
        Ok(LoadedClaim { record, view })
    }

    /// Read one claim and store its projection. On failure the previous
    /// projection, if any, is retained alongside the error.
    pub async fn load(&self, claim_id: u64) -> Result<ClaimView, ClientError> {
        let prior = {
            let mut inner = self.inner.lock().unwrap();
            let prior = inner.claims.get(&claim_id).and_then(|s| s.loaded()).cloned();
            inner.claims.insert(claim_id, ClaimState::Loading);
            prior
        };

        match self.fetch(claim_id).await {
            Ok(loaded) => {
                let view = loaded.view.clone();
                let mut inner = self.inner.lock().unwrap();
                inner.claims.insert(claim_id, ClaimState::Loaded(loaded));
                Ok(view)
            }
            Err(e) => {
                let mut inner = self.inner.lock().unwrap();
                inner.claims.insert(
                    claim_id,
                    ClaimState::Failed {
                        message: e.to_string(),
                        last: prior,
                    },
                );
                Err(e)
            }
        }
    }

    /// Fetch every claim assigned to the viewer, storing each projection and
    /// splitting by this role's verification flag.
    pub async fn list_assigned(&self) -> Result<AssignedClaims, ClientError> {
        if !matches!(self.role, Role::Hospital | Role::Company) {
            return Err(ClientError::Authorization(format!(
                "role {} has no assigned claims",
                self.role
            )));
        }

        let total = self.gateway.total_claims().await?;
        debug!("scanning {} claims for {}", total, self.viewer);

        let mut pending = Vec::new();
        let mut verified = Vec::new();
        for id in 0..total {
            let record = self.gateway.claim(id).await?;
            let assigned = match self.role {
                Role::Hospital => &record.assigned_hospital,
                Role::Company => &record.assigned_company,
                _ => unreachable!(),
            };
            if !assigned.eq_ignore_ascii_case(&self.viewer) {
                continue;
            }

            let view = project(&record, self.role)?;
            let done = match self.role {
                Role::Hospital => record.hospital_verified,
                Role::Company => record.company_verified,
                _ => unreachable!(),
            };
            self.inner.lock().unwrap().claims.insert(
                id,
                ClaimState::Loaded(LoadedClaim {
                    record,
                    view: view.clone(),
                }),
            );
            if done {
                verified.push(view);
            } else {
                pending.push(view);
            }
        }

        Ok(AssignedClaims { pending, verified })
    }

    /// Dispatch this role's verification for a loaded claim.
    ///
    /// Guards, all checked before the gateway is contacted: the role must be
    /// a verifier, no other write for the claim may be in flight, the claim
    /// must have been loaded, the viewer must be the assigned party, and the
    /// projection's `can_verify` must hold. On a failed write the prior
    /// projection is retained untouched; re-triggering is up to the caller.
    pub async fn verify(&self, claim_id: u64) -> Result<ClaimView, ClientError> {
        if !matches!(self.role, Role::Hospital | Role::Company) {
            return Err(ClientError::Authorization(format!(
                "role {} cannot verify claims",
                self.role
            )));
        }

        let prior = {
            let mut inner = self.inner.lock().unwrap();
            if inner.in_flight.contains(&claim_id) {
                return Err(PreconditionError::VerificationInFlight(claim_id).into());
            }
            let loaded = inner
                .claims
                .get(&claim_id)
                .and_then(|s| s.loaded())
                .cloned()
                .ok_or(PreconditionError::ClaimNotLoaded(claim_id))?;

            let assigned = match self.role {
                Role::Hospital => &loaded.record.assigned_hospital,
                Role::Company => &loaded.record.assigned_company,
                _ => unreachable!(),
            };
            if !assigned.eq_ignore_ascii_case(&self.viewer) {
                return Err(ClientError::Authorization(format!(
                    "claim {} is assigned to {}, not to the connected account",
                    claim_id, assigned
                )));
            }

            if !loaded.view.can_verify {
                let refusal = match self.role {
                    Role::Company if !loaded.record.hospital_verified => {
                        PreconditionError::HospitalNotVerified
                    }
                    _ => PreconditionError::AlreadyVerified,
                };
                return Err(refusal.into());
            }

            inner.in_flight.insert(claim_id);
            inner
                .claims
                .insert(claim_id, ClaimState::Submitting(loaded.clone()));
            loaded
        };

        debug!("submitting {} verification for claim {}", self.role, claim_id);
        let result = match self.role {
            Role::Hospital => self.gateway.verify_claim_by_hospital(claim_id).await,
            Role::Company => self.gateway.verify_claim_by_company(claim_id).await,
            _ => unreachable!(),
        };

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                self.settle_failure(claim_id, e.to_string(), prior);
                return Err(e);
            }
        };
        if !receipt.success {
            let message = receipt
                .error
                .unwrap_or_else(|| "transaction receipt reported failure".to_string());
            self.settle_failure(claim_id, message.clone(), prior);
            return Err(ClientError::Transaction(message));
        }

        // The write landed; refresh the projection from chain state.
        match self.fetch(claim_id).await {
            Ok(loaded) => {
                let view = loaded.view.clone();
                let mut inner = self.inner.lock().unwrap();
                inner.in_flight.remove(&claim_id);
                inner.claims.insert(claim_id, ClaimState::Loaded(loaded));
                Ok(view)
            }
            Err(e) => {
                self.settle_failure(claim_id, e.to_string(), prior);
                Err(e)
            }
        }
    }

    fn settle_failure(&self, claim_id: u64, message: String, prior: LoadedClaim) {
        let mut inner = self.inner.lock().unwrap();
        inner.in_flight.remove(&claim_id);
        inner.claims.insert(
            claim_id,
            ClaimState::Failed {
                message,
                last: Some(prior),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreconditionError;
    use crate::testutil::{claim, MockGateway, COMPANY, HOSPITAL};
    use std::time::Duration;

    fn precondition(err: ClientError) -> PreconditionError {
        match err {
            ClientError::Precondition(p) => p,
            other => panic!("expected precondition error, got: {}", other),
        }
    }

    #[tokio::test]
    async fn company_verification_is_refused_before_hospital_signs_off() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, false, false)]));
        let dash = ClaimDashboard::new(Role::Company, COMPANY, gateway.clone());

        dash.load(1).await.unwrap();
        let err = dash.verify(1).await.unwrap_err();
        assert_eq!(precondition(err), PreconditionError::HospitalNotVerified);
        // refused without contacting the gateway
        assert_eq!(gateway.write_count(), 0);
    }

    #[tokio::test]
    async fn re_verifying_a_verified_claim_is_refused() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, true, true)]));
        let dash = ClaimDashboard::new(Role::Company, COMPANY, gateway.clone());

        dash.load(1).await.unwrap();
        let err = dash.verify(1).await.unwrap_err();
        assert_eq!(precondition(err), PreconditionError::AlreadyVerified);
        assert_eq!(gateway.write_count(), 0);
    }

    #[tokio::test]
    async fn verify_requires_a_loaded_claim() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, false, false)]));
        let dash = ClaimDashboard::new(Role::Hospital, HOSPITAL, gateway.clone());

        let err = dash.verify(1).await.unwrap_err();
        assert_eq!(precondition(err), PreconditionError::ClaimNotLoaded(1));
    }

    #[tokio::test]
    async fn unassigned_viewer_is_refused_without_gateway_contact() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, false, false)]));
        let dash = ClaimDashboard::new(
            Role::Hospital,
            "0x9999999999999999999999999999999999999999",
            gateway.clone(),
        );

        dash.load(1).await.unwrap();
        let err = dash.verify(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)));
        assert_eq!(gateway.write_count(), 0);
    }

    #[tokio::test]
    async fn claimant_role_cannot_verify() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, false, false)]));
        let dash = ClaimDashboard::new(Role::Claimant, COMPANY, gateway);
        let err = dash.verify(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)));
    }

    #[tokio::test]
    async fn hospital_then_company_verification_walks_the_lifecycle() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(7, false, false)]));

        let hospital = ClaimDashboard::new(Role::Hospital, HOSPITAL, gateway.clone());
        let view = hospital.load(7).await.unwrap();
        assert!(view.can_verify);

        let view = hospital.verify(7).await.unwrap();
        assert!(view.hospital_verified);
        assert!(!view.can_verify);

        let company = ClaimDashboard::new(Role::Company, COMPANY, gateway.clone());
        let view = company.load(7).await.unwrap();
        assert!(view.can_verify);

        let view = company.verify(7).await.unwrap();
        assert!(view.company_verified);
        assert!(!view.can_verify);
        assert_eq!(view.status_label, "Verified");
    }

    #[tokio::test]
    async fn failed_write_retains_the_loaded_projection() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, false, false)]));
        let dash = ClaimDashboard::new(Role::Hospital, HOSPITAL, gateway.clone());

        let before = dash.load(1).await.unwrap();
        gateway.set_fail_writes(true);

        let err = dash.verify(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Transaction(_)));
        match dash.state(1) {
            ClaimState::Failed { last: Some(last), .. } => assert_eq!(last.view, before),
            other => panic!("expected failed state with retained view, got {:?}", other),
        }

        // the user may re-trigger after a failure, with no reload required
        gateway.set_fail_writes(false);
        let view = dash.verify(1).await.unwrap();
        assert!(view.hospital_verified);
    }

    #[tokio::test]
    async fn second_verification_while_in_flight_is_refused() {
        let gateway = Arc::new(MockGateway::gated(vec![claim(1, false, false)]));
        let dash = Arc::new(ClaimDashboard::new(Role::Hospital, HOSPITAL, gateway.clone()));

        dash.load(1).await.unwrap();

        let first = {
            let dash = dash.clone();
            tokio::spawn(async move { dash.verify(1).await })
        };
        // let the first request reach the gateway and park there
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gateway.write_count(), 1);

        let err = dash.verify(1).await.unwrap_err();
        assert_eq!(precondition(err), PreconditionError::VerificationInFlight(1));

        // the refusal did not disturb the first request
        gateway.release_write();
        let view = first.await.unwrap().unwrap();
        assert!(view.hospital_verified);
        assert_eq!(gateway.write_count(), 1);
    }

    #[tokio::test]
    async fn list_assigned_splits_pending_and_verified() {
        let mut other = claim(2, false, false);
        other.assigned_hospital = "0x9999999999999999999999999999999999999999".to_string();
        let gateway = Arc::new(MockGateway::with_claims(vec![
            claim(0, true, false),
            claim(1, false, false),
            other,
        ]));
        let dash = ClaimDashboard::new(Role::Hospital, HOSPITAL, gateway);

        let assigned = dash.list_assigned().await.unwrap();
        assert_eq!(assigned.pending.len(), 1);
        assert_eq!(assigned.pending[0].id, 1);
        assert_eq!(assigned.verified.len(), 1);
        assert_eq!(assigned.verified[0].id, 0);
    }

    #[tokio::test]
    async fn failed_load_keeps_the_previous_projection() {
        let gateway = Arc::new(MockGateway::with_claims(vec![claim(1, false, false)]));
        let dash = ClaimDashboard::new(Role::Hospital, HOSPITAL, gateway.clone());

        dash.load(1).await.unwrap();
        gateway.claims.lock().unwrap().remove(&1);

        assert!(dash.load(1).await.is_err());
        match dash.state(1) {
            ClaimState::Failed { last: Some(last), .. } => assert_eq!(last.view.id, 1),
            other => panic!("expected failed state with retained view, got {:?}", other),
        }
    }
}
