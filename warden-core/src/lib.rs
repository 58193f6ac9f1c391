//! Warden Core - Fundamental types for the Warden node-governance system.
//!
//! Warden decides, without a trusted auditor, whether each node of a
//! compute-provider fleet is alive and behaving, by having random peer
//! committees vote on it. This crate provides the pieces every other Warden
//! crate builds on:
//!
//! - [`crypto`] - Hashing (BLAKE3) and signatures (Ed25519)
//! - [`node`] - Node ids, wallets and directory records
//! - [`directory`] - Read-only view of the external node registry
//! - [`time`] - Injected clocks and second-resolution timestamps
//! - [`arena`] - Id-indexed storage for monotonic registries
//! - [`error`] - Error codes shared by the whole workspace
//!
//! # Example
//!
//! ```rust
//! use warden_core::{InMemoryDirectory, NodeDirectory, NodeRecord, SecretKey, WalletAddress};
//!
//! let key = SecretKey::generate();
//! let record = NodeRecord::new(key.public_key(), WalletAddress([1u8; 20])).with_gpu("A100", 2);
//! let id = record.id;
//!
//! let directory = InMemoryDirectory::from_records([record]).unwrap();
//! assert!(directory.is_active(&id));
//! assert_eq!(directory.capacity_of(&id).unwrap()["A100"], 2);
//! ```

pub mod arena;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod node;
pub mod time;

pub use arena::{IdArena, Slot};
pub use crypto::{hash, hash_all, hash_pair, Hash, PublicKey, SecretKey, Sig};
pub use directory::{InMemoryDirectory, NodeDirectory, NodeStanding};
pub use error::{Error, ErrorClass, ErrorCode, Result};
pub use node::{GpuCapacity, NodeId, NodeRecord, WalletAddress};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
