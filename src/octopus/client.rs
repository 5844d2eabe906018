use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::OctopusError;
use super::types::{Collection, DEFAULT_PAGE_SIZE, Resources};

// NOTE: header names are case-insensitive; the server documents X-Octopus-ApiKey
const API_KEY_HEADER: &str = "x-octopus-apikey";

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    AccessToken(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Credential::AccessToken(_) => f.write_str("AccessToken([REDACTED])"),
        }
    }
}

/// Query parameters accepted by Octopus list endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub take: Option<i64>,
    pub ids: Vec<String>,
    pub partial_name: Option<String>,
    pub filters: Vec<(&'static str, String)>,
}

impl ListQuery {
    fn to_query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(take) = self.take {
            params.push(("take", take.to_string()));
        }
        if !self.ids.is_empty() {
            params.push(("ids", self.ids.join(",")));
        }
        if let Some(name) = self.partial_name.as_ref().filter(|n| !n.is_empty()) {
            params.push(("partialName", name.clone()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (*k, v.clone())));

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Clone)]
pub struct OctopusClient {
    client: reqwest::Client,
    base_url: String,
    space_id: Option<String>,
}

impl OctopusClient {
    pub fn new(
        address: &str,
        credential: Credential,
        space_id: Option<String>,
    ) -> Result<Self, OctopusError> {
        let url = Url::parse(address).map_err(|e| OctopusError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OctopusError::InvalidAddress {
                address: address.to_string(),
                message: "expected an http or https URL".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        let (name, value) = match &credential {
            Credential::ApiKey(key) => (HeaderName::from_static(API_KEY_HEADER), key.clone()),
            Credential::AccessToken(token) => (AUTHORIZATION, format!("Bearer {}", token)),
        };
        let mut header_value = HeaderValue::from_str(&value).map_err(|_| OctopusError::Auth {
            message: "Invalid credential format".to_string(),
        })?;
        header_value.set_sensitive(true);
        headers.insert(name, header_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(OctopusError::Network)?;

        Ok(Self {
            client,
            base_url: address.trim_end_matches('/').to_string(),
            space_id: space_id.filter(|s| !s.is_empty()),
        })
    }

    pub fn address(&self) -> &str {
        &self.base_url
    }

    /// The space configured on the provider, used when a resource has none.
    pub fn space_id(&self) -> Option<&str> {
        self.space_id.as_deref()
    }

    fn resolve_space<'a>(&'a self, space_id: Option<&'a str>) -> Option<&'a str> {
        space_id.filter(|s| !s.is_empty()).or(self.space_id())
    }

    fn prefix(&self, space_scoped: bool, space_id: Option<&str>) -> String {
        match self.resolve_space(space_id) {
            Some(space) if space_scoped => format!("{}/api/{}", self.base_url, space),
            _ => format!("{}/api", self.base_url),
        }
    }

    pub fn collection_url(&self, collection: Collection, space_id: Option<&str>) -> String {
        format!(
            "{}/{}",
            self.prefix(collection.space_scoped, space_id),
            collection.path
        )
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        space_id: Option<&str>,
        id: &str,
    ) -> Result<T, OctopusError> {
        let url = format!("{}/{}", self.collection_url(collection, space_id), id);
        self.send(Method::GET, &url, None::<&()>).await
    }

    pub async fn create<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        space_id: Option<&str>,
        document: &T,
    ) -> Result<T, OctopusError> {
        let url = self.collection_url(collection, space_id);
        self.send(Method::POST, &url, Some(document)).await
    }

    pub async fn update<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        space_id: Option<&str>,
        id: &str,
        document: &T,
    ) -> Result<T, OctopusError> {
        let url = format!("{}/{}", self.collection_url(collection, space_id), id);
        self.send(Method::PUT, &url, Some(document)).await
    }

    pub async fn delete(
        &self,
        collection: Collection,
        space_id: Option<&str>,
        id: &str,
    ) -> Result<(), OctopusError> {
        let url = format!("{}/{}", self.collection_url(collection, space_id), id);
        let _: serde_json::Value = self.send(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }

    /// Fetches a single page.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        space_id: Option<&str>,
        query: &ListQuery,
    ) -> Result<Resources<T>, OctopusError> {
        let base = self.collection_url(collection, space_id);
        let query = query.to_query_string();
        let url = if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query)
        };
        self.send(Method::GET, &url, None::<&()>).await
    }

    /// Walks `skip`/`take` pages until `TotalResults` items have been read.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
        space_id: Option<&str>,
        query: &ListQuery,
    ) -> Result<Vec<T>, OctopusError> {
        let mut all_results = Vec::new();
        let mut query = ListQuery {
            skip: Some(0),
            take: Some(query.take.unwrap_or(DEFAULT_PAGE_SIZE)),
            ..query.clone()
        };

        loop {
            let page: Resources<T> = self.list(collection, space_id, &query).await?;
            let count = page.items.len() as i64;
            all_results.extend(page.items);

            let read = query.skip.unwrap_or(0) + count;
            if count == 0 || read >= page.total_results {
                break;
            }
            query.skip = Some(read);
        }

        Ok(all_results)
    }

    /// GET on a path below the space prefix, for documents that are not
    /// plain collection members (variable sets).
    pub async fn get_raw<T: DeserializeOwned>(
        &self,
        space_id: Option<&str>,
        path: &str,
    ) -> Result<T, OctopusError> {
        let url = format!("{}/{}", self.prefix(true, space_id), path);
        self.send(Method::GET, &url, None::<&()>).await
    }

    pub async fn put_raw<T: Serialize + DeserializeOwned>(
        &self,
        space_id: Option<&str>,
        path: &str,
        document: &T,
    ) -> Result<T, OctopusError> {
        let url = format!("{}/{}", self.prefix(true, space_id), path);
        self.send(Method::PUT, &url, Some(document)).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, OctopusError> {
        let resource = self.resource_name(url);
        tracing::debug!(%method, resource = %resource, "octopus request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OctopusError::from_response(status.as_u16(), &resource, &text));
        }

        // NOTE: DELETE answers with an empty body on some server versions
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| OctopusError::Decode {
            resource,
            message: e.to_string(),
        })
    }

    // Path relative to the API root, without the query, for logs and errors.
    fn resource_name(&self, url: &str) -> String {
        let path = url
            .strip_prefix(&self.base_url)
            .unwrap_or(url)
            .trim_start_matches("/api/");
        path.split('?').next().unwrap_or(path).to_string()
    }
}

impl std::fmt::Debug for OctopusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctopusClient")
            .field("address", &self.base_url)
            .field("space_id", &self.space_id)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octopus::types::{ENVIRONMENTS, SPACES};

    fn client(space: Option<&str>) -> OctopusClient {
        OctopusClient::new(
            "https://octopus.example.com/",
            Credential::ApiKey("API-SECRET".to_string()),
            space.map(str::to_string),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_address() {
        let result = OctopusClient::new("not a url", Credential::ApiKey("k".to_string()), None);
        assert!(matches!(result, Err(OctopusError::InvalidAddress { .. })));
        let result = OctopusClient::new("ftp://host", Credential::ApiKey("k".to_string()), None);
        assert!(matches!(result, Err(OctopusError::InvalidAddress { .. })));
    }

    #[test]
    fn test_debug_does_not_expose_credentials() {
        let client = client(None);
        let debug_output = format!("{:?}", client);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("API-SECRET"));

        let credential = Credential::AccessToken("eyJ-token".to_string());
        assert!(!format!("{:?}", credential).contains("eyJ-token"));
    }

    #[test]
    fn test_collection_urls() {
        let client = client(None);
        assert_eq!(
            client.collection_url(ENVIRONMENTS, None),
            "https://octopus.example.com/api/environments"
        );
        assert_eq!(
            client.collection_url(ENVIRONMENTS, Some("Spaces-2")),
            "https://octopus.example.com/api/Spaces-2/environments"
        );
        assert_eq!(
            client.collection_url(SPACES, Some("Spaces-2")),
            "https://octopus.example.com/api/spaces"
        );
    }

    #[test]
    fn test_provider_space_is_the_fallback() {
        let client = client(Some("Spaces-1"));
        assert_eq!(
            client.collection_url(ENVIRONMENTS, None),
            "https://octopus.example.com/api/Spaces-1/environments"
        );
        assert_eq!(
            client.collection_url(ENVIRONMENTS, Some("")),
            "https://octopus.example.com/api/Spaces-1/environments"
        );
        assert_eq!(
            client.collection_url(ENVIRONMENTS, Some("Spaces-3")),
            "https://octopus.example.com/api/Spaces-3/environments"
        );
    }

    #[test]
    fn test_query_string_encoding() {
        let query = ListQuery {
            skip: Some(0),
            take: Some(10),
            ids: vec!["Environments-1".to_string(), "Environments-2".to_string()],
            partial_name: Some("Dev & Test".to_string()),
            filters: vec![("feedType", "NuGet".to_string())],
        };
        assert_eq!(
            query.to_query_string(),
            "skip=0&take=10&ids=Environments-1%2CEnvironments-2&partialName=Dev%20%26%20Test&feedType=NuGet"
        );
        assert_eq!(ListQuery::default().to_query_string(), "");
    }

    #[test]
    fn test_resource_name_strips_base_and_query() {
        let client = client(None);
        assert_eq!(
            client.resource_name("https://octopus.example.com/api/Spaces-1/environments?take=1"),
            "Spaces-1/environments"
        );
    }
}
