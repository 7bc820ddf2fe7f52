use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ContentId = String;
pub type HubId = String;
pub type ReleaseId = String;
pub type PostId = String;
pub type AccountId = String;
pub type MintId = String;
pub type TxSignature = String;

/// A release entry published into a hub's content set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub id: ContentId,
    pub hub_id: HubId,
    pub release_id: ReleaseId,
    pub visible: bool,
    pub datetime: DateTime<Utc>,
    pub published_through_hub: bool,
    pub reference_content_id: Option<ContentId>,
}

impl ReleaseRecord {
    pub fn new(
        id: impl Into<ContentId>,
        hub_id: impl Into<HubId>,
        release_id: impl Into<ReleaseId>,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            hub_id: hub_id.into(),
            release_id: release_id.into(),
            visible: true,
            datetime,
            published_through_hub: true,
            reference_content_id: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Marks the record as added from elsewhere rather than published here.
    pub fn reposted(mut self) -> Self {
        self.published_through_hub = false;
        self
    }

    pub fn referencing(mut self, target: impl Into<ContentId>) -> Self {
        self.reference_content_id = Some(target.into());
        self
    }
}

/// A text post entry published into a hub's content set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    pub id: ContentId,
    pub hub_id: HubId,
    pub post_id: PostId,
    pub visible: bool,
    pub datetime: DateTime<Utc>,
    pub published_through_hub: bool,
    pub reference_content_id: Option<ContentId>,
}

impl PostRecord {
    pub fn new(
        id: impl Into<ContentId>,
        hub_id: impl Into<HubId>,
        post_id: impl Into<PostId>,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            hub_id: hub_id.into(),
            post_id: post_id.into(),
            visible: true,
            datetime,
            published_through_hub: true,
            reference_content_id: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn referencing(mut self, target: impl Into<ContentId>) -> Self {
        self.reference_content_id = Some(target.into());
        self
    }
}

/// A raw content record as delivered by the content index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum ContentRecord {
    Release(ReleaseRecord),
    Post(PostRecord),
}

impl ContentRecord {
    pub fn id(&self) -> &str {
        match self {
            ContentRecord::Release(r) => &r.id,
            ContentRecord::Post(p) => &p.id,
        }
    }

    pub fn hub_id(&self) -> &str {
        match self {
            ContentRecord::Release(r) => &r.hub_id,
            ContentRecord::Post(p) => &p.hub_id,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            ContentRecord::Release(r) => r.visible,
            ContentRecord::Post(p) => p.visible,
        }
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        match self {
            ContentRecord::Release(r) => r.datetime,
            ContentRecord::Post(p) => p.datetime,
        }
    }

    pub fn reference_content_id(&self) -> Option<&str> {
        match self {
            ContentRecord::Release(r) => r.reference_content_id.as_deref(),
            ContentRecord::Post(p) => p.reference_content_id.as_deref(),
        }
    }
}

/// A file attached to a release's descriptive metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub uri: String,
}

/// Off-chain descriptive metadata for a release. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub release_id: ReleaseId,
    pub title: String,
    pub artist: String,
    pub image: String,
    pub description: String,
    pub files: Vec<FileRef>,
}

impl ReleaseMetadata {
    pub fn new(
        release_id: impl Into<ReleaseId>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            release_id: release_id.into(),
            title: title.into(),
            artist: artist.into(),
            image: String::new(),
            description: String::new(),
            files: Vec::new(),
        }
    }
}

/// Off-chain body of a text post. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostBody {
    pub post_id: PostId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoyaltyRecipient {
    pub account: AccountId,
    /// Share in basis points.
    pub percent_share: u32,
}

/// On-ledger sale terms for a release.
///
/// `remaining_supply == -1` denotes an unlimited/open edition; `0` is sold out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseTerms {
    pub release_id: ReleaseId,
    /// Price in the payment mint's smallest unit.
    pub price: u64,
    pub payment_mint: MintId,
    pub remaining_supply: i64,
    pub total_supply: u64,
    pub sale_counter: u64,
    /// Resale royalty in basis points.
    pub resale_percentage: u32,
    pub royalty_recipients: Vec<RoyaltyRecipient>,
    pub authority: AccountId,
}

impl ReleaseTerms {
    pub fn open_edition(&self) -> bool {
        self.remaining_supply == -1
    }

    pub fn sold_out(&self) -> bool {
        self.remaining_supply == 0
    }
}

/// A gated file attached to a release, access-controlled by token ownership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gate {
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Opaque handle used to fetch the gated file.
    pub unlock_key: String,
}

/// Handle to a successfully unlocked gated file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileHandle {
    pub file_name: String,
    pub url: String,
}

/// An account granted permission on a hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collaborator {
    pub hub_id: HubId,
    pub account: AccountId,
    pub can_add_content: bool,
}

/// Hub-level terms consulted for permissions and referral fees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HubTerms {
    pub hub_id: HubId,
    pub handle: String,
    pub display_name: String,
    pub description: String,
    pub authority: AccountId,
    /// Referral fee in basis points, added on top of the release price.
    pub referral_fee_bps: u32,
}

impl HubTerms {
    pub fn new(
        hub_id: impl Into<HubId>,
        handle: impl Into<String>,
        authority: impl Into<AccountId>,
    ) -> Self {
        Self {
            hub_id: hub_id.into(),
            handle: handle.into(),
            display_name: String::new(),
            description: String::new(),
            authority: authority.into(),
            referral_fee_bps: 0,
        }
    }
}

/// Ledger actions whose fee balances are pre-checked before submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgramAction {
    ReleasePurchase,
    ReleasePurchaseViaHub,
}

/// Collaborator-reported balance sufficiency for a pending action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceCheck {
    pub sufficient: bool,
    pub msg: String,
}

impl BalanceCheck {
    pub fn sufficient() -> Self {
        Self {
            sufficient: true,
            msg: String::new(),
        }
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self {
            sufficient: false,
            msg: msg.into(),
        }
    }
}

/// A prepared, unsigned purchase transaction handed to the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRequest {
    pub tx_id: String,
    pub release_id: ReleaseId,
    pub hub_id: HubId,
}
