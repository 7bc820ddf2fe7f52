//! In-memory doubles for the connector traits, used by the crate's own tests
//! and available to downstream consumers for theirs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::connectors::{ContentIndex, GateVault, LedgerClient, MetadataStore, WalletProvider};
use crate::error::CoreError;
use crate::types::{
    AccountId, BalanceCheck, Collaborator, FileHandle, Gate, HubId, HubTerms, MintId, PostBody,
    PostId, PostRecord, ProgramAction, ReleaseId, ReleaseMetadata, ReleaseRecord, ReleaseTerms,
    TransactionRequest, TxSignature,
};

/// Wallet double. Connected or not, optionally slow to sign, optionally
/// declining every signature request.
pub struct MockWallet {
    account: Option<AccountId>,
    sign_delay: Option<Duration>,
    decline: Option<String>,
    signed: AtomicUsize,
}

impl MockWallet {
    pub fn disconnected() -> Self {
        Self {
            account: None,
            sign_delay: None,
            decline: None,
            signed: AtomicUsize::new(0),
        }
    }

    pub fn connected(account: impl Into<AccountId>) -> Self {
        Self {
            account: Some(account.into()),
            ..Self::disconnected()
        }
    }

    /// Sleep before signing, so tests can overlap a second call.
    pub fn with_sign_delay(mut self, delay: Duration) -> Self {
        self.sign_delay = Some(delay);
        self
    }

    /// Fail every signature request with `msg`.
    pub fn declining_signature(mut self, msg: impl Into<String>) -> Self {
        self.decline = Some(msg.into());
        self
    }

    pub fn signed_count(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    fn account(&self) -> Option<AccountId> {
        self.account.clone()
    }

    async fn sign_and_send(&self, tx: &TransactionRequest) -> Result<TxSignature, CoreError> {
        if let Some(delay) = self.sign_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = &self.decline {
            return Err(CoreError::TransactionFailed(msg.clone()));
        }
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sig-{}", tx.tx_id))
    }
}

/// Ledger double backed by in-memory release terms and balances. Confirming a
/// transaction records the sale against the release it was prepared for.
pub struct MockLedger {
    releases: Mutex<HashMap<ReleaseId, ReleaseTerms>>,
    balances: HashMap<(AccountId, MintId), u64>,
    insufficient: Option<String>,
    fail_confirmation: Option<String>,
    pending: Mutex<HashMap<TxSignature, ReleaseId>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            releases: Mutex::new(HashMap::new()),
            balances: HashMap::new(),
            insufficient: None,
            fail_confirmation: None,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_release(mut self, terms: ReleaseTerms) -> Self {
        self.releases
            .get_mut()
            .insert(terms.release_id.clone(), terms);
        self
    }

    pub fn with_balance(
        mut self,
        account: impl Into<AccountId>,
        mint: impl Into<MintId>,
        amount: u64,
    ) -> Self {
        self.balances.insert((account.into(), mint.into()), amount);
        self
    }

    /// Report every action pre-check as failed with `msg`.
    pub fn insufficient_for_actions(mut self, msg: impl Into<String>) -> Self {
        self.insufficient = Some(msg.into());
        self
    }

    /// Fail confirmation of every transaction with `msg`.
    pub fn failing_confirmation(mut self, msg: impl Into<String>) -> Self {
        self.fail_confirmation = Some(msg.into());
        self
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn release_terms(&self, release_id: &str) -> Result<ReleaseTerms, CoreError> {
        self.releases
            .lock()
            .await
            .get(release_id)
            .cloned()
            .ok_or_else(|| {
                CoreError::collaborator("ledger", format!("unknown release '{release_id}'"))
            })
    }

    async fn balance(&self, account: &str, mint: &str) -> Result<u64, CoreError> {
        Ok(self
            .balances
            .get(&(account.to_string(), mint.to_string()))
            .copied()
            .unwrap_or(0))
    }

    async fn check_balance_for_action(
        &self,
        _account: &str,
        _action: ProgramAction,
    ) -> Result<BalanceCheck, CoreError> {
        match &self.insufficient {
            Some(msg) => Ok(BalanceCheck::insufficient(msg.clone())),
            None => Ok(BalanceCheck::sufficient()),
        }
    }

    async fn prepare_purchase(
        &self,
        release_id: &str,
        hub_id: &str,
    ) -> Result<TransactionRequest, CoreError> {
        let tx = TransactionRequest {
            tx_id: Uuid::new_v4().to_string(),
            release_id: release_id.to_string(),
            hub_id: hub_id.to_string(),
        };
        self.pending
            .lock()
            .await
            .insert(format!("sig-{}", tx.tx_id), release_id.to_string());
        Ok(tx)
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<(), CoreError> {
        if let Some(msg) = &self.fail_confirmation {
            return Err(CoreError::TransactionFailed(msg.clone()));
        }
        let release_id = self.pending.lock().await.remove(signature);
        if let Some(release_id) = release_id {
            if let Some(terms) = self.releases.lock().await.get_mut(&release_id) {
                if !terms.open_edition() {
                    terms.remaining_supply -= 1;
                }
                terms.sale_counter += 1;
            }
        }
        Ok(())
    }
}

/// Metadata store double. Absent entries resolve to `None`, mirroring a
/// lookup that has not propagated yet.
#[derive(Default)]
pub struct MockMetadataStore {
    releases: HashMap<ReleaseId, ReleaseMetadata>,
    posts: HashMap<PostId, PostBody>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release_metadata(mut self, metadata: ReleaseMetadata) -> Self {
        self.releases.insert(metadata.release_id.clone(), metadata);
        self
    }

    pub fn with_post_body(mut self, body: PostBody) -> Self {
        self.posts.insert(body.post_id.clone(), body);
        self
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn release_metadata(
        &self,
        release_id: &str,
    ) -> Result<Option<ReleaseMetadata>, CoreError> {
        Ok(self.releases.get(release_id).cloned())
    }

    async fn post_body(&self, post_id: &str) -> Result<Option<PostBody>, CoreError> {
        Ok(self.posts.get(post_id).cloned())
    }
}

/// Content index double keyed by hub.
#[derive(Default)]
pub struct MockContentIndex {
    hubs: HashMap<HubId, HubTerms>,
    content: Mutex<HashMap<HubId, (Vec<ReleaseRecord>, Vec<PostRecord>)>>,
    collaborators: HashMap<HubId, Vec<Collaborator>>,
}

impl MockContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hub(mut self, terms: HubTerms) -> Self {
        self.hubs.insert(terms.hub_id.clone(), terms);
        self
    }

    pub fn with_content(
        mut self,
        hub_id: impl Into<HubId>,
        releases: Vec<ReleaseRecord>,
        posts: Vec<PostRecord>,
    ) -> Self {
        self.content.get_mut().insert(hub_id.into(), (releases, posts));
        self
    }

    /// Replace a hub's records after construction, simulating upstream churn.
    pub async fn set_content(
        &self,
        hub_id: impl Into<HubId>,
        releases: Vec<ReleaseRecord>,
        posts: Vec<PostRecord>,
    ) {
        self.content
            .lock()
            .await
            .insert(hub_id.into(), (releases, posts));
    }

    pub fn with_collaborator(mut self, collaborator: Collaborator) -> Self {
        self.collaborators
            .entry(collaborator.hub_id.clone())
            .or_default()
            .push(collaborator);
        self
    }
}

#[async_trait]
impl ContentIndex for MockContentIndex {
    async fn hub_terms(&self, hub_id: &str) -> Result<HubTerms, CoreError> {
        self.hubs.get(hub_id).cloned().ok_or_else(|| {
            CoreError::collaborator("content_index", format!("unknown hub '{hub_id}'"))
        })
    }

    async fn hub_content(
        &self,
        hub_id: &str,
    ) -> Result<(Vec<ReleaseRecord>, Vec<PostRecord>), CoreError> {
        Ok(self.content.lock().await.get(hub_id).cloned().unwrap_or_default())
    }

    async fn hub_collaborators(&self, hub_id: &str) -> Result<Vec<Collaborator>, CoreError> {
        Ok(self.collaborators.get(hub_id).cloned().unwrap_or_default())
    }
}

/// Gate vault double. Files are keyed by unlock key; individual keys can be
/// made to fail, and fetches can be slowed down to overlap unlocks.
#[derive(Default)]
pub struct MockGateVault {
    gates: HashMap<ReleaseId, Vec<Gate>>,
    files: HashMap<String, String>,
    failures: HashMap<String, String>,
    fetch_delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl MockGateVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gates(mut self, release_id: impl Into<ReleaseId>, gates: Vec<Gate>) -> Self {
        self.gates.insert(release_id.into(), gates);
        self
    }

    pub fn with_file(mut self, unlock_key: impl Into<String>, url: impl Into<String>) -> Self {
        self.files.insert(unlock_key.into(), url.into());
        self
    }

    pub fn failing_file(mut self, unlock_key: impl Into<String>, msg: impl Into<String>) -> Self {
        self.failures.insert(unlock_key.into(), msg.into());
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GateVault for MockGateVault {
    async fn release_gates(&self, release_id: &str) -> Result<Vec<Gate>, CoreError> {
        Ok(self.gates.get(release_id).cloned().unwrap_or_default())
    }

    async fn fetch_file(&self, gate: &Gate, _account: &str) -> Result<FileHandle, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = self.failures.get(&gate.unlock_key) {
            return Err(CoreError::gate_unlock(&gate.file_name, msg.clone()));
        }
        match self.files.get(&gate.unlock_key) {
            Some(url) => Ok(FileHandle {
                file_name: gate.file_name.clone(),
                url: url.clone(),
            }),
            None => Err(CoreError::gate_unlock(
                &gate.file_name,
                "no unlock material on file",
            )),
        }
    }
}
