//! Prover grants.
//!
//! An operator binds provers to a verification backend. A bound prover may
//! then claim workload on behalf of a beneficiary wallet, once per nonce,
//! provided the backend accepts the attached evidence.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use warden_core::{Clock, NodeId, Timestamp, WalletAddress};

use crate::backend::{BackendKind, ClaimContext, Evidence, VerificationBackend};
use crate::error::{AttestationError, Result};

/// A bound prover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub prover: NodeId,
    pub backend: BackendKind,
    pub bound_at: Timestamp,
}

/// An accepted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub prover: NodeId,
    pub nonce: u64,
    pub beneficiary: WalletAddress,
    pub workload: u64,
    pub claimed_at: Timestamp,
}

/// Registry of prover grants and consumed claim nonces.
pub struct GrantRegistry<C: Clock> {
    operator: NodeId,
    clock: C,
    backends: BTreeMap<BackendKind, VerificationBackend>,
    grants: BTreeMap<NodeId, Grant>,
    used: BTreeSet<(NodeId, u64)>,
    claims: Vec<Claim>,
}

impl<C: Clock> GrantRegistry<C> {
    pub fn new(operator: NodeId, clock: C) -> Self {
        Self {
            operator,
            clock,
            backends: BTreeMap::new(),
            grants: BTreeMap::new(),
            used: BTreeSet::new(),
            claims: Vec::new(),
        }
    }

    /// Install a backend, replacing any backend of the same kind.
    pub fn register_backend(&mut self, backend: VerificationBackend) {
        info!(kind = %backend.kind(), "Verification backend registered");
        self.backends.insert(backend.kind(), backend);
    }

    pub fn operator(&self) -> NodeId {
        self.operator
    }

    pub fn grant(&self, prover: &NodeId) -> Option<&Grant> {
        self.grants.get(prover)
    }

    pub fn is_prover(&self, prover: &NodeId) -> bool {
        self.grants.contains_key(prover)
    }

    pub fn provers(&self) -> impl Iterator<Item = &NodeId> {
        self.grants.keys()
    }

    /// Unbind `remove`, then bind `add` to the `kind` backend.
    ///
    /// Either every change applies or none does.
    pub fn bind_provers(
        &mut self,
        caller: NodeId,
        remove: &[NodeId],
        add: &[NodeId],
        kind: BackendKind,
    ) -> Result<()> {
        if caller != self.operator {
            return Err(AttestationError::NotOperator(caller));
        }
        if remove.iter().chain(add).any(NodeId::is_zero) {
            return Err(AttestationError::InvalidAddress);
        }
        if !add.is_empty() && !self.backends.contains_key(&kind) {
            return Err(AttestationError::UnknownBackend(kind));
        }

        let mut bound: BTreeSet<NodeId> = self.grants.keys().copied().collect();
        for prover in remove {
            if !bound.remove(prover) {
                return Err(AttestationError::ProverNotBound(*prover));
            }
        }
        for prover in add {
            if !bound.insert(*prover) {
                return Err(AttestationError::ProverAlreadyBound(*prover));
            }
        }

        let now = self.clock.now();
        for prover in remove {
            self.grants.remove(prover);
        }
        for prover in add {
            self.grants.insert(
                *prover,
                Grant {
                    prover: *prover,
                    backend: kind,
                    bound_at: now,
                },
            );
        }
        info!(removed = remove.len(), added = add.len(), %kind, "Provers rebound");
        Ok(())
    }

    /// Claim `workload` for `beneficiary`.
    pub fn claim(
        &mut self,
        prover: NodeId,
        nonce: u64,
        beneficiary: WalletAddress,
        workload: u64,
        evidence: &Evidence,
    ) -> Result<Claim> {
        let grant = self
            .grants
            .get(&prover)
            .ok_or(AttestationError::NotProver(prover))?;
        if beneficiary.is_zero() {
            return Err(AttestationError::InvalidAddress);
        }
        if workload == 0 {
            return Err(AttestationError::ZeroWorkload);
        }
        if self.used.contains(&(prover, nonce)) {
            return Err(AttestationError::ProofAlreadyUsed { prover, nonce });
        }

        let backend = self
            .backends
            .get(&grant.backend)
            .ok_or(AttestationError::UnknownBackend(grant.backend))?;
        let context = ClaimContext {
            prover,
            nonce,
            beneficiary,
            workload,
        };
        if !backend.verify(&context, evidence) {
            warn!(%prover, nonce, kind = %grant.backend, "Claim verification failed");
            return Err(AttestationError::VerificationFailed(grant.backend));
        }

        let claim = Claim {
            prover,
            nonce,
            beneficiary,
            workload,
            claimed_at: self.clock.now(),
        };
        self.used.insert((prover, nonce));
        self.claims.push(claim);
        info!(%prover, nonce, %beneficiary, workload, "Workload claimed");
        Ok(claim)
    }

    /// Whether `(prover, nonce)` has been consumed.
    pub fn is_used(&self, prover: &NodeId, nonce: u64) -> bool {
        self.used.contains(&(*prover, nonce))
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Total workload claimed for a beneficiary.
    pub fn claimed_workload(&self, beneficiary: &WalletAddress) -> u64 {
        self.claims
            .iter()
            .filter(|c| &c.beneficiary == beneficiary)
            .fold(0u64, |acc, c| acc.saturating_add(c.workload))
    }
}
