//! HTTP client for the SASE management API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiError, ApiResult, SaseApi};
use crate::model::{
    BandwidthAllocation, ConnectionPayload, Element, Interface, Location, QosProfile,
    SaseConnection, SecurityZone, Site, WanInterface, WanNetwork, ZoneBinding,
};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.sase.paloaltonetworks.com";

/// Default OAuth2 token endpoint
pub const DEFAULT_AUTH_URL: &str = "https://auth.apps.paloaltonetworks.com/oauth2/access_token";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Service account credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tsg_id: String,
}

/// SASE management API over HTTPS
pub struct HttpSaseApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpSaseApi {
    /// Create a client with an already issued bearer token
    pub fn new(base_url: &str, token: &str) -> ApiResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Obtain a token with the client-credentials grant
    pub async fn login(base_url: &str, auth_url: &str, creds: &Credentials) -> ApiResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        let scope = format!("tsg_id:{}", creds.tsg_id);

        let resp = client
            .post(auth_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("{}: {}", status, text)));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        info!("Authenticated to tenant service group {}", creds.tsg_id);

        Self::new(base_url, &token.access_token)
    }

    // ==========================================
    // Helpers
    // ==========================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        debug!("GET {}", path);
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        debug!("{} {}", method, path);
        let resp = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn get_items<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let list: Items<T> = self.get(path, &[]).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl SaseApi for HttpSaseApi {
    async fn get_locations(&self) -> ApiResult<Vec<Location>> {
        self.get("/sse/config/v1/locations", &[]).await
    }

    async fn get_bandwidth_allocations(&self) -> ApiResult<Vec<BandwidthAllocation>> {
        let list: Data<BandwidthAllocation> =
            self.get("/sse/config/v1/bandwidth-allocations", &[]).await?;
        Ok(list.data)
    }

    async fn get_sites(&self) -> ApiResult<Vec<Site>> {
        self.get_items("/sdwan/v4.7/api/sites").await
    }

    async fn get_wan_networks(&self) -> ApiResult<Vec<WanNetwork>> {
        self.get_items("/sdwan/v2.1/api/wannetworks").await
    }

    async fn query_elements(&self, site_id: &str) -> ApiResult<Vec<Element>> {
        let query = serde_json::json!({
            "query_params": { "site_id": { "in": [site_id] } }
        });
        let list: Items<Element> = self
            .send(reqwest::Method::POST, "/sdwan/v3.0/api/elements/query", &query)
            .await?;
        Ok(list.items)
    }

    async fn get_interfaces(&self, site_id: &str, element_id: &str) -> ApiResult<Vec<Interface>> {
        self.get_items(&format!(
            "/sdwan/v4.15/api/sites/{}/elements/{}/interfaces",
            site_id, element_id
        ))
        .await
    }

    async fn get_wan_interfaces(&self, site_id: &str) -> ApiResult<Vec<WanInterface>> {
        self.get_items(&format!("/sdwan/v2.8/api/sites/{}/waninterfaces", site_id))
            .await
    }

    async fn get_security_zones(&self) -> ApiResult<Vec<SecurityZone>> {
        self.get_items("/sdwan/v2.0/api/securityzones").await
    }

    async fn get_qos_profiles(&self, folder: &str) -> ApiResult<Vec<QosProfile>> {
        let list: Data<QosProfile> = self
            .get("/sse/config/v1/qos-profiles", &[("folder", folder)])
            .await?;
        Ok(list.data)
    }

    async fn get_connections(&self, site_id: &str) -> ApiResult<Vec<SaseConnection>> {
        self.get_items(&format!("/sdwan/v2.0/api/sites/{}/prismasase_connections", site_id))
            .await
    }

    async fn create_connection(
        &self,
        site_id: &str,
        payload: &ConnectionPayload,
    ) -> ApiResult<SaseConnection> {
        self.send(
            reqwest::Method::POST,
            &format!("/sdwan/v2.0/api/sites/{}/prismasase_connections", site_id),
            payload,
        )
        .await
    }

    async fn update_connection(
        &self,
        site_id: &str,
        connection_id: &str,
        connection: &SaseConnection,
    ) -> ApiResult<SaseConnection> {
        self.send(
            reqwest::Method::PUT,
            &format!(
                "/sdwan/v2.0/api/sites/{}/prismasase_connections/{}",
                site_id, connection_id
            ),
            connection,
        )
        .await
    }

    async fn bind_zone(
        &self,
        site_id: &str,
        element_id: &str,
        binding: &ZoneBinding,
    ) -> ApiResult<serde_json::Value> {
        self.send(
            reqwest::Method::POST,
            &format!(
                "/sdwan/v2.0/api/sites/{}/elements/{}/securityzones",
                site_id, element_id
            ),
            binding,
        )
        .await
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> ApiResult<T> {
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))
}

// ==========================================
// Response envelopes
// ==========================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// SD-WAN collection envelope
#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// SSE configuration collection envelope
#[derive(Debug, Deserialize)]
struct Data<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let items: Items<Site> = serde_json::from_str(
            r#"{"count": 1, "items": [{"id": "1", "name": "A", "element_cluster_role": "SPOKE"}]}"#,
        )
        .unwrap();
        assert_eq!(items.items.len(), 1);

        let empty: Data<QosProfile> = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(empty.data.is_empty());
    }

    #[test]
    fn test_base_url_trimmed() {
        let api = HttpSaseApi::new("https://api.example.com/", "token").unwrap();
        assert_eq!(
            api.url("/sdwan/v4.7/api/sites"),
            "https://api.example.com/sdwan/v4.7/api/sites"
        );
    }
}
