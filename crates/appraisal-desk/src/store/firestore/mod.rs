//! Firestore v1 REST backend.
//!
//! Writes go through `documents:commit` so that server timestamps can be
//! attached as field transforms; reads use the document and `runQuery`
//! endpoints. Collection listings follow `nextPageToken` until the whole
//! collection has been materialized.

pub mod value;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    generate_document_id, Direction, Document, DocumentStore, DocumentWrite, Query, StoreError,
};
use crate::config::FirestoreConfig;

const LIST_PAGE_SIZE: u32 = 300;

/// Document-store client speaking the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreDocumentStore {
    client: Client,
    endpoint: String,
    database_path: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// Precondition attached to a commit write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precondition {
    None,
    MustExist,
    MustNotExist,
}

impl FirestoreDocumentStore {
    pub fn new(config: &FirestoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &FirestoreConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            database_path: format!(
                "projects/{}/databases/{}",
                config.project_id, config.database
            ),
            access_token: config.access_token.clone(),
        }
    }

    fn documents_root(&self) -> String {
        format!("{}/documents", self.database_path)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Backend(format!("firestore returned {status}: {body}")))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    async fn commit(
        &self,
        name: String,
        write: DocumentWrite,
        precondition: Precondition,
        mask: bool,
    ) -> Result<(), StoreError> {
        let path = format!("{}:commit", self.documents_root());
        let body = Self::commit_body(name, &write, precondition, mask);
        Self::send(self.request(Method::POST, &path).json(&body)).await?;
        Ok(())
    }

    /// Single-write commit request. The update mask covers only the written
    /// fields; server timestamps travel as `REQUEST_TIME` transforms.
    fn commit_body(
        name: String,
        write: &DocumentWrite,
        precondition: Precondition,
        mask: bool,
    ) -> Value {
        let mut entry = json!({
            "update": {
                "name": name,
                "fields": value::encode_fields(&write.fields),
            },
        });

        if mask {
            let paths: Vec<&String> = write.fields.keys().collect();
            entry["updateMask"] = json!({ "fieldPaths": paths });
        }
        if !write.server_timestamps.is_empty() {
            let transforms: Vec<Value> = write
                .server_timestamps
                .iter()
                .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
                .collect();
            entry["updateTransforms"] = Value::Array(transforms);
        }
        match precondition {
            Precondition::None => {}
            Precondition::MustExist => entry["currentDocument"] = json!({ "exists": true }),
            Precondition::MustNotExist => entry["currentDocument"] = json!({ "exists": false }),
        }

        json!({ "writes": [entry] })
    }

    fn decode_document(raw: RawDocument) -> Result<Document, StoreError> {
        let id = raw
            .name
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("document name '{}'", raw.name)))?
            .to_string();
        let fields = match raw.fields {
            Some(fields) => value::decode_fields(&fields)?,
            None => Default::default(),
        };
        Ok(Document { id, fields })
    }

    /// Decodes a listing page, dropping documents the codec cannot read.
    fn decode_listing<I>(collection: &str, raws: I) -> Vec<Document>
    where
        I: IntoIterator<Item = RawDocument>,
    {
        raws.into_iter()
            .filter_map(|raw| {
                let name = raw.name.clone();
                match Self::decode_document(raw) {
                    Ok(document) => Some(document),
                    Err(err) => {
                        warn!(
                            collection,
                            document = %name,
                            error = %err,
                            "skipping undecodable document"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    async fn list_collection(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = format!("{}/{}", self.documents_root(), collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(Method::GET, &path)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let page: ListResponse = Self::read_json(Self::send(builder).await?).await?;
            documents.extend(Self::decode_listing(collection, page.documents));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(collection, count = documents.len(), "listed firestore collection");
        Ok(documents)
    }

    fn structured_query(collection: &str, query: &Query) -> Value {
        let mut structured = json!({ "from": [{ "collectionId": collection }] });

        let filters: Vec<Value> = query
            .filters
            .iter()
            .map(|filter| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": filter.field },
                        "op": "EQUAL",
                        "value": value::encode(&filter.value),
                    }
                })
            })
            .collect();
        match filters.len() {
            0 => {}
            1 => structured["where"] = filters[0].clone(),
            _ => {
                structured["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": filters }
                })
            }
        }

        if let Some((field, direction)) = &query.order_by {
            let direction = match direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] = json!([{
                "field": { "fieldPath": field },
                "direction": direction,
            }]);
        }

        json!({ "structuredQuery": structured })
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        write: DocumentWrite,
    ) -> Result<String, StoreError> {
        let (id, precondition) = match id {
            Some(id) => (id.to_string(), Precondition::None),
            None => (generate_document_id(), Precondition::MustNotExist),
        };
        let name = self.document_name(collection, &id);
        self.commit(name, write, precondition, false).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let path = self.document_name(collection, id);
        match Self::send(self.request(Method::GET, &path)).await {
            Ok(response) => {
                let raw: RawDocument = Self::read_json(response).await?;
                Self::decode_document(raw).map(Some)
            }
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let name = self.document_name(collection, id);
        self.commit(name, write, Precondition::MustExist, true).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let path = self.document_name(collection, id);
        match Self::send(self.request(Method::DELETE, &path)).await {
            Ok(_) | Err(StoreError::NotFound) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        if query.filters.is_empty() && query.order_by.is_none() {
            return self.list_collection(collection).await;
        }

        let path = format!("{}:runQuery", self.documents_root());
        let body = Self::structured_query(collection, query);
        let items: Vec<RunQueryItem> =
            Self::read_json(Self::send(self.request(Method::POST, &path).json(&body)).await?)
                .await?;

        Ok(Self::decode_listing(
            collection,
            items.into_iter().filter_map(|item| item.document),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Fields;

    fn store() -> FirestoreDocumentStore {
        FirestoreDocumentStore::new(&FirestoreConfig {
            project_id: "appraisal-desk".to_string(),
            database: "(default)".to_string(),
            endpoint: "http://localhost:8080/v1/".to_string(),
            access_token: None,
        })
    }

    #[test]
    fn builds_document_names_and_urls() {
        let store = store();
        let name = store.document_name("locations", "abc123");
        assert_eq!(
            name,
            "projects/appraisal-desk/databases/(default)/documents/locations/abc123"
        );
        assert_eq!(
            store.url(&name),
            "http://localhost:8080/v1/projects/appraisal-desk/databases/(default)/documents/locations/abc123"
        );
    }

    #[test]
    fn decodes_document_id_from_name() {
        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/locations/xyz".to_string(),
            fields: Some(json!({ "city": { "stringValue": "Metro" } })),
        };
        let document = FirestoreDocumentStore::decode_document(raw).expect("document decodes");
        assert_eq!(document.id, "xyz");
        assert_eq!(document.fields["city"], json!("Metro"));
    }

    #[test]
    fn structured_query_filters_and_orders() {
        let query = Query::all()
            .where_eq("appraisal_id", "APP-001")
            .order_by("timestamp", Direction::Descending);
        let body = FirestoreDocumentStore::structured_query("appraisal_logs", &query);
        let structured = &body["structuredQuery"];

        assert_eq!(structured["from"][0]["collectionId"], json!("appraisal_logs"));
        assert_eq!(
            structured["where"]["fieldFilter"]["field"]["fieldPath"],
            json!("appraisal_id")
        );
        assert_eq!(
            structured["where"]["fieldFilter"]["value"],
            json!({ "stringValue": "APP-001" })
        );
        assert_eq!(structured["orderBy"][0]["direction"], json!("DESCENDING"));
    }

    #[test]
    fn structured_query_combines_multiple_filters() {
        let query = Query::all()
            .where_eq("type", "selectable_disclaimer")
            .where_eq("category", "Legal Disclaimers");
        let body = FirestoreDocumentStore::structured_query("report_utilities", &query);
        let composite = &body["structuredQuery"]["where"]["compositeFilter"];

        assert_eq!(composite["op"], json!("AND"));
        assert_eq!(composite["filters"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn listing_skips_documents_with_unsupported_values() {
        let page: ListResponse = serde_json::from_value(json!({
            "documents": [
                {
                    "name": "projects/p/databases/(default)/documents/locations/good",
                    "fields": { "city": { "stringValue": "Metro" } }
                },
                {
                    "name": "projects/p/databases/(default)/documents/locations/bad",
                    "fields": { "embedding": { "vectorValue": { "values": [0.5] } } }
                }
            ]
        }))
        .expect("page deserializes");

        let documents = FirestoreDocumentStore::decode_listing("locations", page.documents);

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "good");
        assert_eq!(documents[0].fields["city"], json!("Metro"));
    }

    #[test]
    fn update_commit_masks_fields_and_stamps_server_time() {
        let mut fields = Fields::new();
        fields.insert("content".to_string(), json!("Updated text"));
        let write = DocumentWrite::new(fields).with_server_timestamp("last_updated");

        let body = FirestoreDocumentStore::commit_body(
            "projects/p/databases/(default)/documents/report_utilities/u1".to_string(),
            &write,
            Precondition::MustExist,
            true,
        );
        let entry = &body["writes"][0];

        assert_eq!(body["writes"].as_array().map(Vec::len), Some(1));
        assert_eq!(
            entry["update"]["fields"]["content"],
            json!({ "stringValue": "Updated text" })
        );
        assert_eq!(entry["updateMask"]["fieldPaths"], json!(["content"]));
        assert_eq!(
            entry["updateTransforms"],
            json!([{ "fieldPath": "last_updated", "setToServerValue": "REQUEST_TIME" }])
        );
        assert_eq!(entry["currentDocument"], json!({ "exists": true }));
    }

    #[test]
    fn insert_commit_without_mask_guards_generated_ids() {
        let mut fields = Fields::new();
        fields.insert("city".to_string(), json!("Metro"));
        let write = DocumentWrite::new(fields);
        let name = "projects/p/databases/(default)/documents/locations/abc".to_string();

        let generated = FirestoreDocumentStore::commit_body(
            name.clone(),
            &write,
            Precondition::MustNotExist,
            false,
        );
        let entry = &generated["writes"][0];
        assert!(entry.get("updateMask").is_none());
        assert!(entry.get("updateTransforms").is_none());
        assert_eq!(entry["currentDocument"], json!({ "exists": false }));

        let caller_id =
            FirestoreDocumentStore::commit_body(name, &write, Precondition::None, false);
        assert!(caller_id["writes"][0].get("currentDocument").is_none());
    }
}
