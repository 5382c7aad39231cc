use std::collections::HashSet;

use thiserror::Error;

use super::{BlockSource, RemoteBlock, RemoteError};

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("listing page {page} failed: {source}")]
    Remote {
        page: usize,
        #[source]
        source: RemoteError,
    },

    #[error("page token {0} returned twice, listing would never end")]
    RepeatedToken(String),

    #[error("page {page} reports more blocks but carries no page token")]
    MissingToken { page: usize },
}

/// Drives `source` until the listing is exhausted and returns every block.
///
/// Reconstruction only starts once this returns: a partial listing is an
/// error, never a shorter document.
pub fn fetch_all_blocks<S: BlockSource + ?Sized>(
    source: &mut S,
    document_id: &str,
) -> Result<Vec<RemoteBlock>, PaginationError> {
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    let mut token: Option<String> = None;
    let mut page = 0;

    loop {
        page += 1;
        let batch = source
            .list_blocks(document_id, token.as_deref())
            .map_err(|source| PaginationError::Remote { page, source })?;
        log::debug!("page {} of {}: {} blocks", page, document_id, batch.items.len());
        blocks.extend(batch.items);

        if !batch.has_more {
            break;
        }
        let next = match batch.page_token {
            Some(next) if !next.is_empty() => next,
            _ => return Err(PaginationError::MissingToken { page }),
        };
        if !seen.insert(next.clone()) {
            return Err(PaginationError::RepeatedToken(next));
        }
        token = Some(next);
    }

    log::info!("fetched {} blocks of {} in {} pages", blocks.len(), document_id, page);
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::BlockPage;
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn block(id: &str) -> RemoteBlock {
        RemoteBlock {
            block_id: id.to_string(),
            block_type: 2,
            parent_id: None,
            children: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Serves canned pages and records the tokens it was asked for.
    struct Pages {
        pages: Vec<BlockPage>,
        requested: Vec<Option<String>>,
    }

    impl BlockSource for Pages {
        fn list_blocks(
            &mut self,
            _document_id: &str,
            page_token: Option<&str>,
        ) -> Result<BlockPage, RemoteError> {
            self.requested.push(page_token.map(str::to_string));
            if self.pages.is_empty() {
                return Err(RemoteError::Api {
                    code: 1,
                    msg: "no more pages".into(),
                });
            }
            Ok(self.pages.remove(0))
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> BlockPage {
        BlockPage {
            items: ids.iter().map(|id| block(id)).collect(),
            page_token: next.map(str::to_string),
            has_more: next.is_some(),
        }
    }

    #[test]
    fn follows_tokens_to_exhaustion() {
        let mut source = Pages {
            pages: vec![page(&["a", "b"], Some("t1")), page(&["c"], Some("t2")), page(&["d"], None)],
            requested: Vec::new(),
        };
        let blocks = fetch_all_blocks(&mut source, "doc").unwrap();

        let ids: Vec<&str> = blocks.iter().map(|b| b.block_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(
            source.requested,
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[test]
    fn repeated_token_is_an_error() {
        let mut source = Pages {
            pages: vec![page(&["a"], Some("t1")), page(&["b"], Some("t1"))],
            requested: Vec::new(),
        };
        let err = fetch_all_blocks(&mut source, "doc").unwrap_err();
        assert!(matches!(err, PaginationError::RepeatedToken(t) if t == "t1"));
    }

    #[test]
    fn has_more_without_token_is_an_error() {
        let mut source = Pages {
            pages: vec![BlockPage {
                items: vec![block("a")],
                page_token: None,
                has_more: true,
            }],
            requested: Vec::new(),
        };
        let err = fetch_all_blocks(&mut source, "doc").unwrap_err();
        assert!(matches!(err, PaginationError::MissingToken { page: 1 }));
    }

    #[test]
    fn failed_page_reports_its_number() {
        let mut source = Pages {
            pages: vec![page(&["a"], Some("t1"))],
            requested: Vec::new(),
        };
        let err = fetch_all_blocks(&mut source, "doc").unwrap_err();
        assert!(matches!(err, PaginationError::Remote { page: 2, .. }));
    }
}
