//! Committee sortition.
//!
//! Each round draws a seed from the round id, its opening time, the active
//! node set and the running vote-log root, then uses a ChaCha20-driven
//! Fisher-Yates shuffle to pick the round's subjects and a committee for
//! each subject. Given the same inputs, every replica draws the same
//! committees; an observer cannot know them before the previous round's
//! votes are final.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use warden_core::{hash_all, hash_pair, Hash, NodeId, Timestamp};

const ROUND_SEED_DOMAIN: &[u8] = b"warden/round-seed/v1";
const COMMITTEE_SEED_DOMAIN: &[u8] = b"warden/committee-seed/v1";

/// Inputs that determine a round's draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedInputs {
    pub round_id: u64,
    pub opened_at: Timestamp,
    /// Commitment to the active node set.
    pub directory_commitment: Hash,
    /// Running hash of every vote accepted so far.
    pub vote_log_root: Hash,
}

impl SeedInputs {
    /// Derive the 32-byte round seed.
    pub fn derive(&self) -> Hash {
        let round_id = self.round_id.to_le_bytes();
        let opened_at = self.opened_at.secs().to_le_bytes();
        hash_all::<&[u8]>(&[
            ROUND_SEED_DOMAIN,
            &round_id,
            &opened_at,
            self.directory_commitment.as_bytes(),
            self.vote_log_root.as_bytes(),
        ])
    }
}

/// Shuffle `items` with Fisher-Yates driven by ChaCha20 seeded from `seed`.
///
/// The input slice is not modified.
pub fn deterministic_shuffle<T: Clone>(items: &[T], seed: &Hash) -> Vec<T> {
    let mut buffer = items.to_vec();
    if buffer.len() < 2 {
        return buffer;
    }

    let mut rng = ChaCha20Rng::from_seed(*seed.as_bytes());
    for i in (1..buffer.len()).rev() {
        let j = rng.gen_range(0..=i);
        buffer.swap(i, j);
    }
    buffer
}

/// Seed for one subject's committee within a round.
pub fn committee_seed(round_seed: &Hash, subject: &NodeId) -> Hash {
    hash_pair(
        *round_seed,
        hash_all::<&[u8]>(&[COMMITTEE_SEED_DOMAIN, subject.as_bytes()]),
    )
}

/// Subjects of a round and the committee judging each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    /// Subjects in draw order.
    pub subjects: Vec<NodeId>,
    /// Committee per subject, in draw order.
    pub committees: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Draw {
    /// Check if nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Draw subjects and committees from the active set.
///
/// `active` should be sorted so every replica shuffles the same sequence.
/// A subject never sits on its own committee. Committees are capped to the
/// active set minus the subject; a subject with nobody left to judge it is
/// not drawn.
pub fn draw(
    active: &[NodeId],
    seed: &Hash,
    committee_size: usize,
    subjects_per_round: Option<usize>,
) -> Draw {
    if active.len() < 2 || committee_size == 0 {
        return Draw::default();
    }

    let subject_count = subjects_per_round
        .unwrap_or(active.len())
        .min(active.len());

    let subjects: Vec<NodeId> = deterministic_shuffle(active, seed)
        .into_iter()
        .take(subject_count)
        .collect();

    let mut committees = BTreeMap::new();
    for subject in &subjects {
        let peers: Vec<NodeId> = active.iter().filter(|n| *n != subject).copied().collect();
        let committee: Vec<NodeId> = deterministic_shuffle(&peers, &committee_seed(seed, subject))
            .into_iter()
            .take(committee_size)
            .collect();
        committees.insert(*subject, committee);
    }

    Draw {
        subjects,
        committees,
    }
}
