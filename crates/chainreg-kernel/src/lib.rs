//! # chainreg kernel
//!
//! Consistency rules for a per-chain registry of asset and contract metadata.
//!
//! This crate is **I/O-free**: it decodes nothing from disk and writes
//! nothing. It prescribes what a record is, the order records are stored in,
//! how bridged assets inherit display metadata from their native origin, and
//! what makes a chain's records valid.
//!
//! ## Architecture
//!
//! ```text
//! record      ← six record kinds, minimal-population predicates
//!     │
//! order       ← enforced per-kind order (stable, idempotent)
//!     │
//! chain       ← one chain's records, all kinds
//!     │
//! propagate   ← native name/symbol/icon → bridged assets (all chains)
//!     │
//! validate    ← findings per chain, ignore list applied once
//! ```

pub mod chain;
pub mod order;
pub mod propagate;
pub mod record;
pub mod validate;

pub use chain::ChainRecords;
pub use order::{EnforcedOrder, is_sorted, sort_records};
pub use propagate::{
    ChainAssets, PropagatedAsset, PropagationError, PropagationReport, SkippedOrigin, propagate,
};
pub use record::{
    Account, Asset, Binary, Contract, Entity, MAX_SYMBOL_CHARS, NATIVE_ASSET_TYPE, NamingDefect,
    Pool, Record, RecordKind, UnknownRecordKind,
};
pub use validate::{
    Finding, IgnoreOutcome, PERMISSIONED_EXCHANGE_TXS, VALIDATION_ORDER, ValidationPolicy,
    apply_ignore_list, validate_chain, validate_registry,
};
