use super::engine::{self, PAGE_LENGTH};
use super::normalizer::normalize;
use super::queries::{CustomQueryArgs, QueryRegistry};
use super::suggest::{sort_by_relevance, to_suggestions};
use super::types::{RawSearchParams, ResultRecord, SearchRequest, Suggestion};
use crate::error::SearchError;
use crate::store::protocol::RecordStore;

use std::sync::Arc;

/// The two link-search entry points over a record store.
pub struct SearchService {
    store: Arc<dyn RecordStore>,
    queries: Arc<QueryRegistry>,
    page_length: usize,
}

impl SearchService {
    pub fn new(store: Arc<dyn RecordStore>, queries: Arc<QueryRegistry>, page_length: usize) -> Arc<Self> {
        Arc::new(Self {
            store,
            queries,
            page_length: if page_length == 0 { PAGE_LENGTH } else { page_length },
        })
    }

    pub fn page_length(&self) -> usize {
        self.page_length
    }

    /// Raw records for the search box.
    pub async fn search_widget(&self, raw: RawSearchParams) -> Result<Vec<ResultRecord>, SearchError> {
        let req = normalize(raw)?;
        self.run(&req).await
    }

    /// Suggestions for a link field. Always the first page: any `start`
    /// in the parameters is dropped.
    pub async fn search_link(&self, mut raw: RawSearchParams) -> Result<Vec<Suggestion>, SearchError> {
        raw.txt = raw.txt.trim().to_string();
        raw.start = None;
        let records = self.search_widget(raw).await?;
        Ok(to_suggestions(&records))
    }

    /// Executes an already normalized request.
    ///
    /// An unknown record type yields no results rather than an error.
    pub async fn run(&self, req: &SearchRequest) -> Result<Vec<ResultRecord>, SearchError> {
        if !self.store.exists(&req.doctype).await? {
            tracing::debug!("Unknown record type {:?}, returning no results", req.doctype);
            return Ok(Vec::new());
        }

        match &req.query {
            Some(name) => {
                let args = CustomQueryArgs {
                    doctype: req.doctype.clone(),
                    txt: req.text.clone(),
                    search_field: req.search_field.clone(),
                    start: req.start,
                    page_length: self.page_length,
                    filters: req.filters.clone(),
                    reference_doctype: req.reference_doctype.clone(),
                };
                let mut records = self.queries.execute(name, self.store.clone(), args).await?;
                sort_by_relevance(&req.text, &mut records);
                Ok(records)
            }
            None => engine::search(self.store.as_ref(), req, self.page_length).await,
        }
    }
}
