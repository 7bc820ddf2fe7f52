use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{
    AccountId, BalanceCheck, Collaborator, FileHandle, Gate, HubTerms, PostBody, PostRecord,
    ProgramAction, ReleaseMetadata, ReleaseRecord, ReleaseTerms, TransactionRequest, TxSignature,
};

/// Connected account identity plus transaction signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn is_connected(&self) -> bool;

    fn account(&self) -> Option<AccountId>;

    /// Sign the prepared transaction and submit it. Resolves once the wallet
    /// has approved and the transaction is on its way.
    async fn sign_and_send(&self, tx: &TransactionRequest) -> Result<TxSignature, CoreError>;
}

/// Source of truth for balances, release terms, and transaction execution.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn release_terms(&self, release_id: &str) -> Result<ReleaseTerms, CoreError>;

    async fn balance(&self, account: &str, mint: &str) -> Result<u64, CoreError>;

    /// Whether `account` can cover the fees of the given action. The returned
    /// message is collaborator-authored and surfaced verbatim on failure.
    async fn check_balance_for_action(
        &self,
        account: &str,
        action: ProgramAction,
    ) -> Result<BalanceCheck, CoreError>;

    async fn prepare_purchase(
        &self,
        release_id: &str,
        hub_id: &str,
    ) -> Result<TransactionRequest, CoreError>;

    /// Await finality for a signed, submitted transaction.
    async fn confirm_transaction(&self, signature: &str) -> Result<(), CoreError>;
}

/// Off-chain descriptive metadata, keyed by content id. Lookups that have not
/// resolved yet return `None`; the core treats that as eventual consistency,
/// never as an error.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn release_metadata(
        &self,
        release_id: &str,
    ) -> Result<Option<ReleaseMetadata>, CoreError>;

    async fn post_body(&self, post_id: &str) -> Result<Option<PostBody>, CoreError>;
}

/// Index of a hub's raw content records and permissions.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn hub_terms(&self, hub_id: &str) -> Result<HubTerms, CoreError>;

    /// Raw (release, post) record streams for the hub.
    async fn hub_content(
        &self,
        hub_id: &str,
    ) -> Result<(Vec<ReleaseRecord>, Vec<PostRecord>), CoreError>;

    async fn hub_collaborators(&self, hub_id: &str) -> Result<Vec<Collaborator>, CoreError>;
}

/// Token-gated file storage attached to releases.
#[async_trait]
pub trait GateVault: Send + Sync {
    async fn release_gates(&self, release_id: &str) -> Result<Vec<Gate>, CoreError>;

    /// Exchange a gate's unlock key for a fetchable file handle.
    async fn fetch_file(&self, gate: &Gate, account: &str) -> Result<FileHandle, CoreError>;
}
