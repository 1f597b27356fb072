//! Feishu open platform: tenant tokens and bitable records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use crate::{
    error::{RemoteError, Result},
    http_client::HttpClient,
};

/// Maximum number of records per search page.
pub const PAGE_SIZE: usize = 500;
/// Maximum number of records per batch create request.
pub const CREATE_BATCH_SIZE: usize = 1000;
/// Maximum number of records per batch delete request.
pub const DELETE_BATCH_SIZE: usize = 500;

/// Tokens are treated as expired this long before the platform says so.
const EXPIRY_MARGIN_SECONDS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Record {
    pub record_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// The subset of the bitable API used by duckcp.
///
/// Batch calls send exactly one request; callers split their input by [`CREATE_BATCH_SIZE`]
/// and [`DELETE_BATCH_SIZE`].
pub trait BitableApi: Send + Sync {
    fn tenant_access_token(&self, app_id: &str, app_secret: &str) -> Result<IssuedToken>;

    /// Fetches every record of a table, following pagination.
    fn list_records(&self, token: &str, document: &str, table: &str) -> Result<Vec<Record>>;

    /// Creates records and returns their ids in input order.
    fn batch_create(
        &self,
        token: &str,
        document: &str,
        table: &str,
        records: &[Map<String, Value>],
    ) -> Result<Vec<String>>;

    fn batch_delete(
        &self,
        token: &str,
        document: &str,
        table: &str,
        record_ids: &[String],
    ) -> Result<()>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: i64,
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    has_more: bool,
    page_token: Option<String>,
    #[serde(default)]
    items: Vec<Record>,
}

#[derive(Deserialize)]
struct CreatedRecords {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Serialize)]
struct NewRecord<'a> {
    fields: &'a Map<String, Value>,
}

pub struct FeishuClient {
    http: HttpClient,
    open_api: String,
}

impl FeishuClient {
    pub fn new<S: Into<String>>(http: HttpClient, open_api: S) -> Self {
        Self {
            http,
            open_api: open_api.into().trim_end_matches('/').to_string(),
        }
    }

    fn records_url(&self, document: &str, table: &str, action: &str) -> String {
        format!(
            "{}/bitable/v1/apps/{document}/tables/{table}/records/{action}",
            self.open_api
        )
    }

    fn call<B, T>(&self, api: &str, url: &str, token: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let envelope: Envelope<T> = self.http.post_json(url, Some(token), body)?;
        if envelope.code != 0 {
            return Err(RemoteError::Api {
                api: api.into(),
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        envelope.data.ok_or_else(|| {
            RemoteError::InvalidResponse {
                url: url.into(),
                reason: "missing data".into(),
            }
        })
    }
}

impl BitableApi for FeishuClient {
    fn tenant_access_token(&self, app_id: &str, app_secret: &str) -> Result<IssuedToken> {
        let url = format!("{}/auth/v3/tenant_access_token/internal/", self.open_api);
        let response: TokenResponse = self.http.post_json(
            &url,
            None,
            &json!({"app_id": app_id, "app_secret": app_secret}),
        )?;
        if response.code != 0 {
            return Err(RemoteError::Api {
                api: "tenant_access_token".into(),
                code: response.code,
                msg: response.msg,
            });
        }

        debug!(app_id, expire = response.expire, "issued tenant access token");
        Ok(IssuedToken {
            access_token: response.tenant_access_token,
            expired_at: Utc::now() + Duration::seconds(response.expire - EXPIRY_MARGIN_SECONDS),
        })
    }

    fn list_records(&self, token: &str, document: &str, table: &str) -> Result<Vec<Record>> {
        let base = self.records_url(document, table, "search");
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = Url::parse(&base).map_err(|err| {
                RemoteError::InvalidUrl {
                    url: base.clone(),
                    source: err,
                }
            })?;
            url.query_pairs_mut()
                .append_pair("page_size", &PAGE_SIZE.to_string());
            if let Some(page_token) = &page_token {
                url.query_pairs_mut().append_pair("page_token", page_token);
            }

            let page: SearchPage = self.call("search_records", url.as_str(), token, &json!({}))?;
            records.extend(page.items);
            match page.page_token {
                Some(next) if page.has_more => page_token = Some(next),
                _ => break,
            }
        }

        debug!(document, table, records = records.len(), "listed bitable records");
        Ok(records)
    }

    fn batch_create(
        &self,
        token: &str,
        document: &str,
        table: &str,
        records: &[Map<String, Value>],
    ) -> Result<Vec<String>> {
        let url = self.records_url(document, table, "batch_create");
        let body = json!({
            "records": records.iter().map(|fields| NewRecord { fields }).collect::<Vec<_>>(),
        });
        let created: CreatedRecords = self.call("batch_create_records", &url, token, &body)?;
        Ok(created
            .records
            .into_iter()
            .map(|record| record.record_id)
            .collect())
    }

    fn batch_delete(
        &self,
        token: &str,
        document: &str,
        table: &str,
        record_ids: &[String],
    ) -> Result<()> {
        let url = self.records_url(document, table, "batch_delete");
        let _: Value = self.call(
            "batch_delete_records",
            &url,
            token,
            &json!({ "records": record_ids }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::ClientConfig;

    #[test]
    fn test_envelope_decoding() {
        let envelope: Envelope<SearchPage> = serde_json::from_str(
            r#"{"code":0,"msg":"success","data":{"has_more":true,"page_token":"p2",
                "items":[{"record_id":"rec1","fields":{"name":"a","age":3}}]}}"#,
        )
        .unwrap();
        let page = envelope.data.unwrap();
        assert!(page.has_more);
        assert_eq!(page.page_token.as_deref(), Some("p2"));
        assert_eq!(page.items[0].record_id, "rec1");
        assert_eq!(page.items[0].fields["age"], 3);
    }

    #[test]
    fn test_error_envelope_without_data() {
        let envelope: Envelope<Value> =
            serde_json::from_str(r#"{"code":1254045,"msg":"FieldNameNotFound"}"#).unwrap();
        assert_eq!(envelope.code, 1254045);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_records_url() {
        let http = HttpClient::new(&ClientConfig::default()).unwrap();
        let client = FeishuClient::new(http, "https://open.feishu.cn/open-apis/");
        assert_eq!(
            client.records_url("doc", "tbl", "batch_create"),
            "https://open.feishu.cn/open-apis/bitable/v1/apps/doc/tables/tbl/records/batch_create"
        );
    }

    #[test]
    fn test_new_record_serialization() {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::from("a"));
        let body = json!({ "records": [NewRecord { fields: &fields }] });
        assert_eq!(body.to_string(), r#"{"records":[{"fields":{"name":"a"}}]}"#);
    }
}
