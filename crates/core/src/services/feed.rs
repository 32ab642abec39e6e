//! Feed aggregation service.
//!
//! The feed is computed on read: the caller's followed profiles (always
//! including themselves) are resolved first, then their dweets are merged
//! newest first.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, FixedOffset};
use dwitter_common::{AppError, AppResult};
use dwitter_db::{
    entities::{dweet, profile},
    repositories::{DweetRepository, ProfileRepository, UserRepository},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::graph::GraphService;

/// Position of the last item of a feed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: DateTime<FixedOffset>,
    pub id: String,
}

impl FeedCursor {
    /// Cursor pointing at the given dweet.
    #[must_use]
    pub fn of(dweet: &dweet::Model) -> Self {
        Self {
            created_at: dweet.created_at,
            id: dweet.id.clone(),
        }
    }

    /// Encode as an opaque URL-safe string.
    pub fn encode(&self) -> AppResult<String> {
        let json = serde_json::to_vec(self).map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a string produced by [`FeedCursor::encode`].
    pub fn decode(s: &str) -> AppResult<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|_| AppError::BadRequest("Malformed feed cursor".to_string()))?;
        serde_json::from_slice(&json)
            .map_err(|_| AppError::BadRequest("Malformed feed cursor".to_string()))
    }

    /// Whether `dweet` comes strictly after this cursor in feed order.
    fn precedes(&self, dweet: &dweet::Model) -> bool {
        dweet.created_at < self.created_at
            || (dweet.created_at == self.created_at && dweet.id > self.id)
    }
}

/// Options for building a feed. The default returns the whole feed.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub limit: Option<u64>,
    pub before: Option<FeedCursor>,
}

/// A dweet together with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub dweet: dweet::Model,
    pub author_display_name: String,
}

/// One page of a feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// Set only when the page was cut short by the limit.
    pub next_cursor: Option<FeedCursor>,
}

/// Feed service composing the social graph with stored dweets.
#[derive(Clone)]
pub struct FeedService {
    graph: GraphService,
    dweet_repo: DweetRepository,
    user_repo: UserRepository,
    profile_repo: ProfileRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        graph: GraphService,
        dweet_repo: DweetRepository,
        user_repo: UserRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            graph,
            dweet_repo,
            user_repo,
            profile_repo,
        }
    }

    /// Build the feed of a user, newest first.
    ///
    /// Never fails for a user who follows nobody but themselves or has no
    /// dweets: the page is simply empty.
    pub async fn build_feed(&self, user_id: &str, query: FeedQuery) -> AppResult<FeedPage> {
        if query.limit == Some(0) {
            return Err(AppError::Validation(
                "Feed limit must be positive".to_string(),
            ));
        }

        let profile = self.graph.ensure_profile(user_id).await?;
        let following = self.graph.get_following(&profile.id).await?;

        let author_ids: Vec<String> = following.iter().map(|p| p.id.clone()).collect();
        let dweets = self.dweet_repo.find_by_authors(&author_ids).await?;

        let (dweets, next_cursor) = paginate(dweets, &query);
        let items = self.attach_display_names(&following, dweets).await?;

        debug!(
            user_id = %user_id,
            profile_id = %profile.id,
            authors = author_ids.len(),
            items = items.len(),
            "Built feed"
        );

        Ok(FeedPage { items, next_cursor })
    }

    /// All profiles except the given user's own, in creation order.
    pub async fn list_profiles(&self, excluding_user_id: &str) -> AppResult<Vec<profile::Model>> {
        self.profile_repo.find_all_except_user(excluding_user_id).await
    }

    async fn attach_display_names(
        &self,
        authors: &[profile::Model],
        dweets: Vec<dweet::Model>,
    ) -> AppResult<Vec<FeedItem>> {
        let user_ids: Vec<String> = authors.iter().map(|p| p.user_id.clone()).collect();
        let users = self.user_repo.find_by_ids(&user_ids).await?;

        let username_by_user: HashMap<&str, &str> = users
            .iter()
            .map(|u| (u.id.as_str(), u.username.as_str()))
            .collect();
        let name_by_profile: HashMap<&str, &str> = authors
            .iter()
            .filter_map(|p| {
                username_by_user
                    .get(p.user_id.as_str())
                    .map(|name| (p.id.as_str(), *name))
            })
            .collect();

        Ok(dweets
            .into_iter()
            .map(|dweet| {
                let author_display_name = name_by_profile
                    .get(dweet.author_id.as_str())
                    .map_or_else(String::new, |name| (*name).to_string());
                FeedItem {
                    dweet,
                    author_display_name,
                }
            })
            .collect())
    }
}

/// Sort newest first, skip up to the cursor and apply the limit.
fn paginate(
    mut dweets: Vec<dweet::Model>,
    query: &FeedQuery,
) -> (Vec<dweet::Model>, Option<FeedCursor>) {
    dweets.sort_by(dweet::Model::cmp_newest_first);

    if let Some(cursor) = &query.before {
        dweets.retain(|d| cursor.precedes(d));
    }

    let limit = query
        .limit
        .and_then(|l| usize::try_from(l).ok())
        .unwrap_or(usize::MAX);

    if dweets.len() > limit {
        dweets.truncate(limit);
        let next = dweets.last().map(FeedCursor::of);
        (dweets, next)
    } else {
        (dweets, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(id: &str, author_id: &str, secs: i64) -> dweet::Model {
        dweet::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            body: format!("dweet {id}"),
            created_at: (Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs))
                .into(),
        }
    }

    fn ids(dweets: &[dweet::Model]) -> Vec<&str> {
        dweets.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_paginate_orders_newest_first() {
        let dweets = vec![at("d1", "p2", 1), at("d2", "p2", 3), at("d3", "p1", 2)];

        let (page, next) = paginate(dweets, &FeedQuery::default());

        assert_eq!(ids(&page), vec!["d2", "d3", "d1"]);
        assert!(next.is_none());
    }

    #[test]
    fn test_paginate_ties_broken_by_id() {
        let dweets = vec![at("b", "p1", 5), at("c", "p2", 5), at("a", "p1", 5)];

        let (page, _) = paginate(dweets, &FeedQuery::default());

        assert_eq!(ids(&page), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_paginate_empty() {
        let (page, next) = paginate(vec![], &FeedQuery::default());

        assert!(page.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_paginate_walks_pages_without_gaps() {
        let all = vec![
            at("a", "p1", 4),
            at("b", "p1", 3),
            at("c", "p2", 3),
            at("d", "p2", 2),
            at("e", "p1", 1),
        ];

        let mut seen = Vec::new();
        let mut before = None;
        loop {
            let query = FeedQuery {
                limit: Some(2),
                before: before.clone(),
            };
            let (page, next) = paginate(all.clone(), &query);
            seen.extend(page.into_iter().map(|d| d.id));
            match next {
                Some(cursor) => before = Some(cursor),
                None => break,
            }
        }

        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_paginate_exact_fit_has_no_next_cursor() {
        let dweets = vec![at("a", "p1", 2), at("b", "p1", 1)];
        let query = FeedQuery {
            limit: Some(2),
            before: None,
        };

        let (page, next) = paginate(dweets, &query);

        assert_eq!(page.len(), 2);
        assert!(next.is_none());
    }

    #[test]
    fn test_cursor_round_trip() {
        let cursor = FeedCursor::of(&at("01jxyz", "p1", 7));

        let decoded = FeedCursor::decode(&cursor.encode().unwrap()).unwrap();

        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_cursor_decode_rejects_garbage() {
        assert!(matches!(
            FeedCursor::decode("not a cursor!"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            FeedCursor::decode(&URL_SAFE_NO_PAD.encode(b"{}")),
            Err(AppError::BadRequest(_))
        ));
    }
}
