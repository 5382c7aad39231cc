//! Blocking HTTP implementation of the remote capabilities.
//!
//! Every response is wrapped in `{ "code": 0, "msg": "success", "data": ... }`;
//! a non-zero `code` is a failure even when the HTTP status is 200. No
//! retries happen here: a failed call is reported once to the caller.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::domain::{BlockDescriptor, TableSpec};

use super::wire::{self, TABLE_TEMP_ID};
use super::{BlockPage, BlockSink, BlockSource, CreatedBlocks, RemoteBlock, RemoteError};

pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";
pub const DEFAULT_PAGE_SIZE: usize = 500;
/// Largest page the listing endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 500;

const API_PREFIX: &str = "/open-apis/docx/v1/documents";

/// Connection settings, built from the CLI config.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub access_token: Option<String>,
    pub page_size: usize,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChildrenData {
    #[serde(default)]
    children: Vec<RemoteBlock>,
}

#[derive(Debug, Deserialize)]
struct IdRelation {
    temporary_block_id: String,
    block_id: String,
}

#[derive(Debug, Deserialize)]
struct DescendantData {
    #[serde(default)]
    children: Vec<RemoteBlock>,
    #[serde(default)]
    block_id_relations: Vec<IdRelation>,
}

#[derive(Debug, Deserialize)]
struct BlockData {
    block: RemoteBlock,
}

#[derive(Debug, Deserialize)]
struct DocumentMeta {
    document_id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentData {
    document: DocumentMeta,
}

/// Client for the docx block API.
pub struct LarkClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: usize,
}

impl LarkClient {
    pub fn new(settings: ClientSettings) -> Result<Self, RemoteError> {
        let token = settings
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(RemoteError::MissingToken)?;
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token,
            page_size: settings.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        let body = response.text()?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(RemoteError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Err(err) => return Err(RemoteError::Decode(err.to_string())),
        };
        if envelope.code != 0 {
            return Err(RemoteError::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data = envelope.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    /// Creates an empty document and returns its id.
    pub fn create_document(
        &self,
        title: Option<&str>,
        folder_token: Option<&str>,
    ) -> Result<String, RemoteError> {
        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("title".into(), json!(title));
        }
        if let Some(folder) = folder_token {
            body.insert("folder_token".into(), json!(folder));
        }
        let data: DocumentData = self.send(self.http.post(self.url("")).json(&body))?;
        log::info!("created document {}", data.document.document_id);
        Ok(data.document.document_id)
    }

    /// Number of children currently under `block_id`.
    pub fn child_count(&self, document_id: &str, block_id: &str) -> Result<usize, RemoteError> {
        let url = self.url(&format!("/{}/blocks/{}", document_id, block_id));
        let data: BlockData = self.send(
            self.http
                .get(url)
                .query(&[("document_revision_id", "-1")]),
        )?;
        Ok(data.block.children.len())
    }
}

impl BlockSink for LarkClient {
    fn create_blocks(
        &mut self,
        document_id: &str,
        parent_id: &str,
        index: usize,
        blocks: &[BlockDescriptor],
    ) -> Result<CreatedBlocks, RemoteError> {
        let url = self.url(&format!("/{}/blocks/{}/children", document_id, parent_id));
        let body = wire::children_request(blocks, index);
        let data: ChildrenData = self.send(
            self.http
                .post(url)
                .query(&[("document_revision_id", "-1")])
                .json(&body),
        )?;
        let ids: Vec<String> = data.children.into_iter().map(|b| b.block_id).collect();
        Ok(CreatedBlocks {
            created_count: ids.len(),
            ids,
        })
    }

    fn create_table(
        &mut self,
        document_id: &str,
        parent_id: &str,
        index: usize,
        table: &TableSpec,
    ) -> Result<String, RemoteError> {
        let url = self.url(&format!("/{}/blocks/{}/descendant", document_id, parent_id));
        let body = wire::table_request(table, index);
        let data: DescendantData = self.send(
            self.http
                .post(url)
                .query(&[("document_revision_id", "-1")])
                .json(&body),
        )?;

        data.block_id_relations
            .into_iter()
            .find(|rel| rel.temporary_block_id == TABLE_TEMP_ID)
            .map(|rel| rel.block_id)
            .or_else(|| data.children.into_iter().next().map(|b| b.block_id))
            .ok_or_else(|| RemoteError::Decode("descendant response has no table id".into()))
    }
}

impl BlockSource for LarkClient {
    fn list_blocks(
        &mut self,
        document_id: &str,
        page_token: Option<&str>,
    ) -> Result<BlockPage, RemoteError> {
        let url = self.url(&format!("/{}/blocks", document_id));
        let page_size = self.page_size.to_string();
        let mut query = vec![
            ("page_size", page_size.as_str()),
            ("document_revision_id", "-1"),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token));
        }
        self.send(self.http.get(url).query(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_rejected() {
        let err = LarkClient::new(ClientSettings::default()).err().unwrap();
        assert!(matches!(err, RemoteError::MissingToken));

        let blank = ClientSettings {
            access_token: Some("  ".into()),
            ..ClientSettings::default()
        };
        assert!(matches!(LarkClient::new(blank), Err(RemoteError::MissingToken)));
    }

    #[test]
    fn page_size_is_clamped_and_urls_are_joined() {
        let client = LarkClient::new(ClientSettings {
            base_url: "https://example.test/".into(),
            access_token: Some("t-123".into()),
            page_size: 10_000,
            ..ClientSettings::default()
        })
        .unwrap();
        assert_eq!(client.page_size, MAX_PAGE_SIZE);
        assert_eq!(
            client.url("/doc/blocks"),
            "https://example.test/open-apis/docx/v1/documents/doc/blocks"
        );
    }
}
