//! Resound core: hub content aggregation and purchase coordination.
//!
//! This crate assembles a hub's releases and posts into one ordered,
//! reference-deduplicated feed, and coordinates the purchase and access-gating
//! flows around releases with explicit staging and single-flight guarantees.

#![deny(unsafe_code)]

pub mod aggregation;
pub mod connectors;
pub mod error;
pub mod gates;
pub mod mocks;
pub mod pricing;
pub mod purchase;
pub mod refs;
pub mod session;
pub mod types;
pub mod visibility;

pub use aggregation::{aggregate, ContentKind, Feed, FeedItem};
pub use connectors::{ContentIndex, GateVault, LedgerClient, MetadataStore, WalletProvider};
pub use error::CoreError;
pub use gates::{file_size_label, AccessGateEvaluator, GateEvaluation, GateStatus};
pub use pricing::{edition_summary, purchase_button, resale_percent, Pricing, PurchaseButton};
pub use purchase::{
    PurchaseConfig, PurchaseCoordinator, PurchaseNotice, PurchaseResult, PurchaseStage,
};
pub use refs::ReferenceGraph;
pub use session::HubSession;
pub use types::{
    AccountId, BalanceCheck, Collaborator, ContentId, ContentRecord, FileHandle, FileRef, Gate,
    HubId, HubTerms, MintId, PostBody, PostId, PostRecord, ProgramAction, ReleaseId,
    ReleaseMetadata, ReleaseRecord, ReleaseTerms, RoyaltyRecipient, TransactionRequest,
    TxSignature,
};
pub use visibility::can_add_content;
