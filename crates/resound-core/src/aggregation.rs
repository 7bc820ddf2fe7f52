use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::refs::ReferenceGraph;
use crate::types::{
    ContentRecord, HubId, PostBody, PostId, PostRecord, ReleaseId, ReleaseMetadata, ReleaseRecord,
};

/// Facet classification of content encountered while assembling a feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Release,
    Repost,
    TextPost,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentKind::Release => "Releases",
            ContentKind::Repost => "Reposts",
            ContentKind::TextPost => "Text Posts",
        };
        f.write_str(label)
    }
}

/// A fully resolved entry in the ordered feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedItem {
    Release {
        record: ReleaseRecord,
        metadata: ReleaseMetadata,
    },
    Post {
        record: PostRecord,
        body: PostBody,
    },
    /// A post commenting on a release, carrying that release's metadata so the
    /// release needs no duplicate top-level entry.
    PostWithRelease {
        record: PostRecord,
        body: PostBody,
        release_metadata: ReleaseMetadata,
    },
}

impl FeedItem {
    pub fn datetime(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            FeedItem::Release { record, .. } => record.datetime,
            FeedItem::Post { record, .. } => record.datetime,
            FeedItem::PostWithRelease { record, .. } => record.datetime,
        }
    }

    pub fn content_id(&self) -> &str {
        match self {
            FeedItem::Release { record, .. } => &record.id,
            FeedItem::Post { record, .. } => &record.id,
            FeedItem::PostWithRelease { record, .. } => &record.id,
        }
    }
}

/// Ordered feed for one hub plus the distinct content kinds it contains.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feed {
    pub items: Vec<FeedItem>,
    pub kinds: BTreeSet<ContentKind>,
}

impl Feed {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Merges a hub's release and post records into one ordered feed.
///
/// The merge is a pure function of its inputs: callers recompute on snapshot
/// replacement rather than tracking incremental changes. Missing metadata or
/// bodies, dangling references, and records for other hubs all degrade by
/// omission; only a blank hub id is an error.
pub fn aggregate(
    hub_id: &str,
    release_records: &[ReleaseRecord],
    post_records: &[PostRecord],
    metadata_lookup: &HashMap<ReleaseId, ReleaseMetadata>,
    post_body_lookup: &HashMap<PostId, PostBody>,
) -> Result<Feed, CoreError> {
    if hub_id.trim().is_empty() {
        return Err(CoreError::InvalidInput("hub id must not be blank".into()));
    }

    // Candidate set: both streams, restricted to the requested hub.
    let mut candidates: Vec<ContentRecord> = Vec::new();
    candidates.extend(
        release_records
            .iter()
            .filter(|r| r.hub_id == hub_id)
            .cloned()
            .map(ContentRecord::Release),
    );
    candidates.extend(
        post_records
            .iter()
            .filter(|p| p.hub_id == hub_id)
            .cloned()
            .map(ContentRecord::Post),
    );

    let graph = ReferenceGraph::build(&candidates);

    // Release records resolvable by release id, for post reference upgrades.
    let releases_by_id: HashMap<&str, &ReleaseRecord> = candidates
        .iter()
        .filter_map(|c| match c {
            ContentRecord::Release(r) => Some((r.release_id.as_str(), r)),
            ContentRecord::Post(_) => None,
        })
        .collect();

    let mut items: Vec<FeedItem> = Vec::new();
    let mut kinds: BTreeSet<ContentKind> = BTreeSet::new();

    for candidate in &candidates {
        match candidate {
            ContentRecord::Release(record) => {
                if !record.visible {
                    continue;
                }
                let Some(metadata) = metadata_lookup.get(&record.release_id) else {
                    // Metadata has not resolved yet: no entry, not even a
                    // placeholder. The next snapshot will pick it up.
                    continue;
                };
                if record.published_through_hub {
                    kinds.insert(ContentKind::Release);
                } else {
                    kinds.insert(ContentKind::Repost);
                }
                // A release that is the target of a reference is shown through
                // its referencing item instead of at top level.
                if graph.is_referenced(&record.release_id) {
                    continue;
                }
                items.push(FeedItem::Release {
                    record: record.clone(),
                    metadata: metadata.clone(),
                });
            }
            ContentRecord::Post(record) => {
                if !record.visible {
                    continue;
                }
                let Some(body) = post_body_lookup.get(&record.post_id) else {
                    continue;
                };
                kinds.insert(ContentKind::TextPost);

                let referenced_release = record
                    .reference_content_id
                    .as_deref()
                    .and_then(|target| releases_by_id.get(target))
                    .filter(|release| release.visible)
                    .and_then(|release| metadata_lookup.get(&release.release_id));

                match referenced_release {
                    Some(release_metadata) => items.push(FeedItem::PostWithRelease {
                        record: record.clone(),
                        body: body.clone(),
                        release_metadata: release_metadata.clone(),
                    }),
                    // Hidden or unresolvable reference: degrade to a plain post.
                    None => items.push(FeedItem::Post {
                        record: record.clone(),
                        body: body.clone(),
                    }),
                }
            }
        }
    }

    // Most recent first; ties keep input order (sort_by is stable).
    items.sort_by(|a, b| b.datetime().cmp(&a.datetime()));

    debug!(
        hub_id,
        candidates = candidates.len(),
        items = items.len(),
        references = graph.edge_count(),
        "assembled hub feed"
    );

    Ok(Feed { items, kinds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn dt(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).single().unwrap()
    }

    fn body(post_id: &str) -> PostBody {
        PostBody {
            post_id: post_id.into(),
            text: format!("body of {post_id}"),
            created_at: dt(0),
        }
    }

    fn metadata_for(ids: &[&str]) -> HashMap<ReleaseId, ReleaseMetadata> {
        ids.iter()
            .map(|id| {
                (
                    id.to_string(),
                    ReleaseMetadata::new(*id, format!("title {id}"), "artist"),
                )
            })
            .collect()
    }

    fn bodies_for(ids: &[&str]) -> HashMap<PostId, PostBody> {
        ids.iter().map(|id| (id.to_string(), body(id))).collect()
    }

    #[test]
    fn referenced_release_is_suppressed() {
        let releases = vec![ReleaseRecord::new("c1", "hub-a", "r1", dt(200))];
        let posts = vec![PostRecord::new("c2", "hub-a", "p1", dt(300)).referencing("r1")];

        let feed = aggregate(
            "hub-a",
            &releases,
            &posts,
            &metadata_for(&["r1"]),
            &bodies_for(&["p1"]),
        )
        .unwrap();

        assert_eq!(feed.items.len(), 1);
        match &feed.items[0] {
            FeedItem::PostWithRelease {
                record,
                release_metadata,
                ..
            } => {
                assert_eq!(record.post_id, "p1");
                assert_eq!(release_metadata.release_id, "r1");
            }
            other => panic!("expected PostWithRelease, got {other:?}"),
        }
    }

    #[test]
    fn hidden_records_never_appear() {
        let releases = vec![ReleaseRecord::new("c1", "hub-a", "r2", dt(100)).hidden()];
        let posts = vec![PostRecord::new("c2", "hub-a", "p1", dt(200)).hidden()];

        let feed = aggregate(
            "hub-a",
            &releases,
            &posts,
            &metadata_for(&["r2"]),
            &bodies_for(&["p1"]),
        )
        .unwrap();

        assert!(feed.is_empty());
        assert!(feed.kinds.is_empty());
    }

    #[test]
    fn feed_is_sorted_most_recent_first_with_stable_ties() {
        let releases = vec![
            ReleaseRecord::new("c1", "hub-a", "r1", dt(100)),
            ReleaseRecord::new("c2", "hub-a", "r2", dt(300)),
            ReleaseRecord::new("c3", "hub-a", "r3", dt(100)),
        ];
        let feed = aggregate(
            "hub-a",
            &releases,
            &[],
            &metadata_for(&["r1", "r2", "r3"]),
            &HashMap::new(),
        )
        .unwrap();

        let ids: Vec<&str> = feed.items.iter().map(|i| i.content_id()).collect();
        assert_eq!(ids, ["c2", "c1", "c3"]);
        for pair in feed.items.windows(2) {
            assert!(pair[0].datetime() >= pair[1].datetime());
        }
    }

    #[test]
    fn aggregate_is_idempotent() {
        let releases = vec![
            ReleaseRecord::new("c1", "hub-a", "r1", dt(100)),
            ReleaseRecord::new("c2", "hub-a", "r2", dt(300)),
        ];
        let posts = vec![PostRecord::new("c3", "hub-a", "p1", dt(200))];
        let metadata = metadata_for(&["r1", "r2"]);
        let bodies = bodies_for(&["p1"]);

        let first = aggregate("hub-a", &releases, &posts, &metadata, &bodies).unwrap();
        let second = aggregate("hub-a", &releases, &posts, &metadata, &bodies).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn kinds_track_releases_reposts_and_posts() {
        let releases = vec![
            ReleaseRecord::new("c1", "hub-a", "r1", dt(100)),
            ReleaseRecord::new("c2", "hub-a", "r2", dt(200)).reposted(),
        ];
        let posts = vec![PostRecord::new("c3", "hub-a", "p1", dt(300))];

        let feed = aggregate(
            "hub-a",
            &releases,
            &posts,
            &metadata_for(&["r1", "r2"]),
            &bodies_for(&["p1"]),
        )
        .unwrap();

        assert_eq!(
            feed.kinds,
            BTreeSet::from([ContentKind::Release, ContentKind::Repost, ContentKind::TextPost])
        );
    }

    #[test]
    fn suppressed_release_still_contributes_its_kind() {
        let releases = vec![ReleaseRecord::new("c1", "hub-a", "r1", dt(100))];
        let posts = vec![PostRecord::new("c2", "hub-a", "p1", dt(200)).referencing("r1")];

        let feed = aggregate(
            "hub-a",
            &releases,
            &posts,
            &metadata_for(&["r1"]),
            &bodies_for(&["p1"]),
        )
        .unwrap();

        assert!(feed.kinds.contains(&ContentKind::Release));
        assert!(!feed
            .items
            .iter()
            .any(|item| matches!(item, FeedItem::Release { .. })));
    }

    #[test]
    fn release_without_metadata_is_omitted() {
        let releases = vec![ReleaseRecord::new("c1", "hub-a", "r1", dt(100))];
        let feed = aggregate("hub-a", &releases, &[], &HashMap::new(), &HashMap::new()).unwrap();
        assert!(feed.is_empty());
        assert!(feed.kinds.is_empty());
    }

    #[test]
    fn post_referencing_hidden_release_degrades_to_plain_post() {
        let releases = vec![ReleaseRecord::new("c1", "hub-a", "r1", dt(100)).hidden()];
        let posts = vec![PostRecord::new("c2", "hub-a", "p1", dt(200)).referencing("r1")];

        let feed = aggregate(
            "hub-a",
            &releases,
            &posts,
            &metadata_for(&["r1"]),
            &bodies_for(&["p1"]),
        )
        .unwrap();

        assert_eq!(feed.items.len(), 1);
        assert!(matches!(&feed.items[0], FeedItem::Post { .. }));
    }

    #[test]
    fn post_with_dangling_reference_degrades_to_plain_post() {
        let posts = vec![PostRecord::new("c1", "hub-a", "p1", dt(200)).referencing("r-ghost")];
        let feed = aggregate(
            "hub-a",
            &[],
            &posts,
            &HashMap::new(),
            &bodies_for(&["p1"]),
        )
        .unwrap();

        assert_eq!(feed.items.len(), 1);
        assert!(matches!(&feed.items[0], FeedItem::Post { .. }));
    }

    #[test]
    fn records_for_other_hubs_are_skipped() {
        let releases = vec![
            ReleaseRecord::new("c1", "hub-a", "r1", dt(100)),
            ReleaseRecord::new("c2", "hub-b", "r2", dt(200)),
        ];
        let feed = aggregate(
            "hub-a",
            &releases,
            &[],
            &metadata_for(&["r1", "r2"]),
            &HashMap::new(),
        )
        .unwrap();

        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].content_id(), "c1");
    }

    #[test]
    fn blank_hub_id_is_invalid_input() {
        let result = aggregate("  ", &[], &[], &HashMap::new(), &HashMap::new());
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn post_without_body_is_omitted() {
        let posts = vec![PostRecord::new("c1", "hub-a", "p1", dt(100))];
        let feed = aggregate("hub-a", &[], &posts, &HashMap::new(), &HashMap::new()).unwrap();
        assert!(feed.is_empty());
    }
}
