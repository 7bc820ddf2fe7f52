use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::connectors::{LedgerClient, WalletProvider};
use crate::error::CoreError;
use crate::pricing::Pricing;
use crate::types::{AccountId, HubTerms, MintId, ProgramAction, ReleaseId, ReleaseTerms, TxSignature};

/// Where an in-flight purchase currently is. `Idle` and `Completed` are not
/// represented: a key absent from the in-flight table is idle, and completion
/// is the returned [`PurchaseResult`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStage {
    /// Claimed before the first await so rapid repeat submissions are rejected
    /// even while the balance pre-check is still pending.
    Preflight,
    AwaitingWalletApproval,
    TransactionPending,
}

/// Non-blocking notices emitted before submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseNotice {
    /// Payment mint is not native and the stable balance cannot cover the
    /// total: an implicit swap will be calculated along the way.
    CalculatingSwap,
    PreparingTransaction,
}

/// Terminal outcome of a purchase attempt. Transaction-layer failures land
/// here with `success == false`; they are never raised as errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseResult {
    pub success: bool,
    pub msg: String,
    pub notices: Vec<PurchaseNotice>,
    pub signature: Option<TxSignature>,
}

impl PurchaseResult {
    fn completed(signature: TxSignature, msg: String, notices: Vec<PurchaseNotice>) -> Self {
        Self {
            success: true,
            msg,
            notices,
            signature: Some(signature),
        }
    }

    fn failed(msg: String, notices: Vec<PurchaseNotice>) -> Self {
        Self {
            success: false,
            msg,
            notices,
            signature: None,
        }
    }
}

/// Configuration for the purchase coordinator.
#[derive(Debug, Clone)]
pub struct PurchaseConfig {
    pub pricing: Pricing,
    /// Mint consulted for the implicit-swap notice.
    pub stable_mint: MintId,
    /// Ledger action whose fee balance is pre-checked.
    pub action: ProgramAction,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            pricing: Pricing::default(),
            stable_mint: "usdc".into(),
            action: ProgramAction::ReleasePurchaseViaHub,
        }
    }
}

type FlightKey = (AccountId, ReleaseId);

/// Orchestrates the purchase flow for releases: balance sufficiency, currency
/// notices, wallet approval, transaction confirmation, and snapshot refresh.
///
/// Invariant: at most one purchase is in flight per (account, release) pair.
/// A second invocation while one is pending is rejected with
/// [`CoreError::PurchaseAlreadyInProgress`] rather than queued. Every exit
/// path removes the in-flight entry, so state cannot leak across hub or
/// release switches.
pub struct PurchaseCoordinator {
    wallet: Arc<dyn WalletProvider>,
    ledger: Arc<dyn LedgerClient>,
    config: PurchaseConfig,
    in_flight: Mutex<HashMap<FlightKey, PurchaseStage>>,
    terms_cache: RwLock<HashMap<ReleaseId, ReleaseTerms>>,
    balance_cache: RwLock<HashMap<(AccountId, MintId), u64>>,
}

impl PurchaseCoordinator {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        ledger: Arc<dyn LedgerClient>,
        config: PurchaseConfig,
    ) -> Self {
        Self {
            wallet,
            ledger,
            config,
            in_flight: Mutex::new(HashMap::new()),
            terms_cache: RwLock::new(HashMap::new()),
            balance_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PurchaseConfig {
        &self.config
    }

    /// Current stage of an in-flight purchase, if any, for UI polling.
    pub async fn stage(&self, account: &str, release_id: &str) -> Option<PurchaseStage> {
        self.in_flight
            .lock()
            .await
            .get(&(account.to_string(), release_id.to_string()))
            .copied()
    }

    /// Purchase one edition of `release` through `hub`.
    ///
    /// Callers must not invoke this for sold-out releases; the purchase button
    /// in `pricing` is the enforcement point and the coordinator does not
    /// re-check supply.
    pub async fn purchase(
        &self,
        release: &ReleaseTerms,
        hub: &HubTerms,
    ) -> Result<PurchaseResult, CoreError> {
        if !self.wallet.is_connected() {
            warn!(release_id = %release.release_id, "purchase attempted without a connected wallet");
            return Err(CoreError::NotAuthenticated);
        }
        let account = self.wallet.account().ok_or(CoreError::NotAuthenticated)?;
        let key: FlightKey = (account.clone(), release.release_id.clone());

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight.contains_key(&key) {
                debug!(release_id = %release.release_id, "duplicate purchase rejected");
                return Err(CoreError::PurchaseAlreadyInProgress {
                    release_id: release.release_id.clone(),
                });
            }
            in_flight.insert(key.clone(), PurchaseStage::Preflight);
        }

        let result = self.run_purchase(&key, &account, release, hub).await;
        self.in_flight.lock().await.remove(&key);
        result
    }

    async fn run_purchase(
        &self,
        key: &FlightKey,
        account: &str,
        release: &ReleaseTerms,
        hub: &HubTerms,
    ) -> Result<PurchaseResult, CoreError> {
        let check = self
            .ledger
            .check_balance_for_action(account, self.config.action)
            .await?;
        if !check.sufficient {
            return Err(CoreError::InsufficientBalance { msg: check.msg });
        }

        let notices = vec![self.pre_submission_notice(account, release, hub).await];

        let tx = match self
            .ledger
            .prepare_purchase(&release.release_id, &hub.hub_id)
            .await
        {
            Ok(tx) => tx,
            Err(err) => {
                let classified = CoreError::TransactionFailed(err.to_string());
                warn!(release_id = %release.release_id, %err, "purchase preparation failed");
                return Ok(PurchaseResult::failed(classified.to_string(), notices));
            }
        };

        self.set_stage(key, PurchaseStage::AwaitingWalletApproval)
            .await;
        info!(release_id = %release.release_id, account, "awaiting wallet approval");
        let signature = match self.wallet.sign_and_send(&tx).await {
            Ok(signature) => signature,
            Err(err) => {
                let classified = CoreError::TransactionFailed(err.to_string());
                warn!(release_id = %release.release_id, %err, "wallet declined or failed to sign");
                return Ok(PurchaseResult::failed(classified.to_string(), notices));
            }
        };

        self.set_stage(key, PurchaseStage::TransactionPending).await;
        debug!(release_id = %release.release_id, %signature, "transaction pending");
        match self.ledger.confirm_transaction(&signature).await {
            Ok(()) => {
                info!(release_id = %release.release_id, %signature, "purchase confirmed");
                // The sale changed both the release terms and the actor's
                // balance; replace both snapshots.
                self.refresh_after_purchase(account, release).await;
                Ok(PurchaseResult::completed(
                    signature,
                    format!("Purchased '{}'", release.release_id),
                    notices,
                ))
            }
            Err(err) => {
                let classified = CoreError::TransactionFailed(err.to_string());
                warn!(release_id = %release.release_id, %err, "transaction failed");
                Ok(PurchaseResult::failed(classified.to_string(), notices))
            }
        }
    }

    /// Decide which informational notice precedes submission. Purely advisory;
    /// a failed stable-balance read downgrades to the default notice.
    async fn pre_submission_notice(
        &self,
        account: &str,
        release: &ReleaseTerms,
        hub: &HubTerms,
    ) -> PurchaseNotice {
        let pricing = &self.config.pricing;
        if pricing.is_native(&release.payment_mint) {
            return PurchaseNotice::PreparingTransaction;
        }

        let price_ui = pricing.to_display_units(release.price, &release.payment_mint);
        let total_with_referral = price_ui + price_ui * hub.referral_fee_bps as f64 / 10_000.0;

        match self.ledger.balance(account, &self.config.stable_mint).await {
            Ok(balance) => {
                let balance_ui = pricing.to_display_units(balance, &self.config.stable_mint);
                if balance_ui < total_with_referral {
                    PurchaseNotice::CalculatingSwap
                } else {
                    PurchaseNotice::PreparingTransaction
                }
            }
            Err(err) => {
                warn!(%err, "stable balance unavailable for swap notice");
                PurchaseNotice::PreparingTransaction
            }
        }
    }

    async fn set_stage(&self, key: &FlightKey, stage: PurchaseStage) {
        if let Some(entry) = self.in_flight.lock().await.get_mut(key) {
            *entry = stage;
        }
    }

    async fn refresh_after_purchase(&self, account: &str, release: &ReleaseTerms) {
        if let Err(err) = self.refresh_release(&release.release_id).await {
            warn!(release_id = %release.release_id, %err, "release terms refresh failed");
        }
        if let Err(err) = self.refresh_balance(account, &release.payment_mint).await {
            warn!(account, %err, "balance refresh failed");
        }
    }

    /// Re-fetch release terms from the ledger, replacing the cached snapshot.
    pub async fn refresh_release(&self, release_id: &str) -> Result<ReleaseTerms, CoreError> {
        let terms = self.ledger.release_terms(release_id).await?;
        self.terms_cache
            .write()
            .await
            .insert(release_id.to_string(), terms.clone());
        Ok(terms)
    }

    /// Cached release terms, fetching on first access.
    pub async fn release_terms(&self, release_id: &str) -> Result<ReleaseTerms, CoreError> {
        if let Some(terms) = self.terms_cache.read().await.get(release_id) {
            return Ok(terms.clone());
        }
        self.refresh_release(release_id).await
    }

    /// Re-fetch a balance from the ledger, replacing the cached snapshot.
    pub async fn refresh_balance(&self, account: &str, mint: &str) -> Result<u64, CoreError> {
        let balance = self.ledger.balance(account, mint).await?;
        self.balance_cache
            .write()
            .await
            .insert((account.to_string(), mint.to_string()), balance);
        Ok(balance)
    }

    /// Cached balance snapshot, fetching on first access.
    pub async fn balance(&self, account: &str, mint: &str) -> Result<u64, CoreError> {
        if let Some(balance) = self
            .balance_cache
            .read()
            .await
            .get(&(account.to_string(), mint.to_string()))
        {
            return Ok(*balance);
        }
        self.refresh_balance(account, mint).await
    }

    /// Whether the connected actor owns the release.
    pub fn actor_is_authority(&self, release: &ReleaseTerms) -> bool {
        self.wallet
            .account()
            .is_some_and(|account| account == release.authority)
    }

    /// Whether the connected actor holds a non-zero royalty share.
    pub fn actor_is_royalty_recipient(&self, release: &ReleaseTerms) -> bool {
        let Some(account) = self.wallet.account() else {
            return false;
        };
        release
            .royalty_recipients
            .iter()
            .any(|r| r.account == account && r.percent_share > 0)
    }
}
