use super::loaders::{load_groups, load_users};
use super::types::{
    GROUPS_CACHE_KEY, MentionCandidate, USER_DOCTYPE, USER_GROUP_DOCTYPE, USER_PROFILE_DOCTYPE,
    USERS_CACHE_KEY,
};
use crate::cache::ValueCache;
use crate::error::SearchError;
use crate::store::protocol::RecordStore;

use std::sync::Arc;

/// Cache shared by every resolver in the process: one entry per pool.
pub type MentionCache = ValueCache<Arc<Vec<MentionCandidate>>>;

pub struct MentionResolver {
    store: Arc<dyn RecordStore>,
    cache: Arc<MentionCache>,
    site_url: String,
}

impl MentionResolver {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<MentionCache>, site_url: &str) -> Arc<Self> {
        Arc::new(Self {
            store,
            cache,
            site_url: site_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn cache(&self) -> &Arc<MentionCache> {
        &self.cache
    }

    /// Users and groups whose display value contains `search_term`
    /// (case-insensitive), sorted by raw display value.
    ///
    /// An empty or whitespace-only term matches every candidate.
    pub async fn find_mentions(&self, search_term: &str) -> Result<Vec<MentionCandidate>, SearchError> {
        let users = self
            .cache
            .get_or_load(USERS_CACHE_KEY, || async {
                Ok(Arc::new(load_users(self.store.as_ref()).await?))
            })
            .await?;
        let groups = self
            .cache
            .get_or_load(GROUPS_CACHE_KEY, || async {
                Ok(Arc::new(load_groups(self.store.as_ref()).await?))
            })
            .await?;

        let needle = search_term.trim().to_lowercase();
        let mut mentions: Vec<MentionCandidate> = users
            .iter()
            .chain(groups.iter())
            .filter(|candidate| candidate.value.to_lowercase().contains(&needle))
            .map(|candidate| MentionCandidate {
                link: self.form_url(candidate),
                ..candidate.clone()
            })
            .collect();

        mentions.sort_by(|a, b| a.value.cmp(&b.value));

        tracing::debug!(
            "Mention lookup '{}' matched {} of {} candidates",
            search_term,
            mentions.len(),
            users.len() + groups.len()
        );
        Ok(mentions)
    }

    /// Drops the pool built from `doctype`, if any. Called after writes.
    pub fn invalidate_for_doctype(&self, doctype: &str) -> bool {
        match doctype {
            USER_DOCTYPE => self.cache.invalidate(USERS_CACHE_KEY),
            USER_GROUP_DOCTYPE => self.cache.invalidate(GROUPS_CACHE_KEY),
            _ => false,
        }
    }

    fn form_url(&self, candidate: &MentionCandidate) -> String {
        let doctype = if candidate.is_group {
            USER_GROUP_DOCTYPE
        } else {
            USER_PROFILE_DOCTYPE
        };
        format!(
            "{}/app/{}/{}",
            self.site_url,
            slug(doctype),
            urlencoding::encode(&candidate.id)
        )
    }
}

fn slug(doctype: &str) -> String {
    doctype.to_lowercase().replace(' ', "-")
}
