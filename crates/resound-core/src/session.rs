use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::aggregation::{aggregate, Feed};
use crate::connectors::{ContentIndex, MetadataStore, WalletProvider};
use crate::error::CoreError;
use crate::types::{
    Collaborator, HubId, HubTerms, PostBody, PostId, PostRecord, ReleaseId, ReleaseMetadata,
    ReleaseRecord,
};
use crate::visibility::can_add_content;

/// One hub's records and resolved lookups, captured at a point in time.
#[derive(Clone)]
struct HubSnapshot {
    hub: HubTerms,
    releases: Vec<ReleaseRecord>,
    posts: Vec<PostRecord>,
    collaborators: Vec<Collaborator>,
    metadata: HashMap<ReleaseId, ReleaseMetadata>,
    bodies: HashMap<PostId, PostBody>,
}

/// A viewing session against a single hub.
///
/// Activation loads a full snapshot; [`HubSession::refresh`] replaces it
/// wholesale rather than patching it, so the feed is always a pure function
/// of one consistent capture.
pub struct HubSession {
    hub_id: HubId,
    index: Arc<dyn ContentIndex>,
    metadata: Arc<dyn MetadataStore>,
    wallet: Arc<dyn WalletProvider>,
    snapshot: RwLock<HubSnapshot>,
}

impl HubSession {
    /// Open a session on `hub_id`, loading its initial snapshot.
    pub async fn activate(
        hub_id: impl Into<HubId>,
        index: Arc<dyn ContentIndex>,
        metadata: Arc<dyn MetadataStore>,
        wallet: Arc<dyn WalletProvider>,
    ) -> Result<Self, CoreError> {
        let hub_id = hub_id.into();
        if hub_id.trim().is_empty() {
            return Err(CoreError::InvalidInput("hub id must not be blank".into()));
        }
        let snapshot = load_snapshot(&hub_id, index.as_ref(), metadata.as_ref()).await?;
        info!(
            hub_id = %hub_id,
            releases = snapshot.releases.len(),
            posts = snapshot.posts.len(),
            "hub session activated"
        );
        Ok(Self {
            hub_id,
            index,
            metadata,
            wallet,
            snapshot: RwLock::new(snapshot),
        })
    }

    pub fn hub_id(&self) -> &str {
        &self.hub_id
    }

    pub async fn hub(&self) -> HubTerms {
        self.snapshot.read().await.hub.clone()
    }

    /// Assemble the ordered feed from the current snapshot.
    pub async fn feed(&self) -> Result<Feed, CoreError> {
        let snapshot = self.snapshot.read().await;
        aggregate(
            &self.hub_id,
            &snapshot.releases,
            &snapshot.posts,
            &snapshot.metadata,
            &snapshot.bodies,
        )
    }

    /// Reload the snapshot from the collaborators, discarding the old one.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let fresh = load_snapshot(&self.hub_id, self.index.as_ref(), self.metadata.as_ref()).await?;
        debug!(hub_id = %self.hub_id, "hub snapshot replaced");
        *self.snapshot.write().await = fresh;
        Ok(())
    }

    /// Whether the connected actor may add content to this hub. Collaborator
    /// grants are re-read on every call rather than served from the snapshot.
    pub async fn can_add_content(&self) -> Result<bool, CoreError> {
        let collaborators = self.index.hub_collaborators(&self.hub_id).await?;
        let hub = self.snapshot.read().await.hub.clone();
        Ok(can_add_content(
            self.wallet.account().as_ref(),
            &hub,
            &collaborators,
        ))
    }
}

async fn load_snapshot(
    hub_id: &str,
    index: &dyn ContentIndex,
    metadata_store: &dyn MetadataStore,
) -> Result<HubSnapshot, CoreError> {
    let hub = index.hub_terms(hub_id).await?;
    let (releases, posts) = index.hub_content(hub_id).await?;
    let collaborators = index.hub_collaborators(hub_id).await?;

    // Reposts repeat a release id; resolve each id once.
    let mut metadata = HashMap::new();
    for record in &releases {
        if metadata.contains_key(&record.release_id) {
            continue;
        }
        if let Some(found) = metadata_store.release_metadata(&record.release_id).await? {
            metadata.insert(record.release_id.clone(), found);
        }
    }

    let mut bodies = HashMap::new();
    for record in &posts {
        if let Some(found) = metadata_store.post_body(&record.post_id).await? {
            bodies.insert(record.post_id.clone(), found);
        }
    }

    Ok(HubSnapshot {
        hub,
        releases,
        posts,
        collaborators,
        metadata,
        bodies,
    })
}
