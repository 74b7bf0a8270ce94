//! Remote management API
//!
//! The orchestration engine only talks to [`SaseApi`]; transport and
//! authentication live in [`http`].

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    BandwidthAllocation, ConnectionPayload, Element, Interface, Location, QosProfile,
    SaseConnection, SecurityZone, Site, WanInterface, WanNetwork, ZoneBinding,
};

pub use http::HttpSaseApi;

/// Folder holding the QoS profiles of remote networks
pub const REMOTE_NETWORKS_FOLDER: &str = "Remote Networks";

/// Transport-level failures
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Auth(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations of the SASE management API used by the orchestrator
#[async_trait]
pub trait SaseApi: Send + Sync {
    async fn get_locations(&self) -> ApiResult<Vec<Location>>;

    async fn get_bandwidth_allocations(&self) -> ApiResult<Vec<BandwidthAllocation>>;

    async fn get_sites(&self) -> ApiResult<Vec<Site>>;

    async fn get_wan_networks(&self) -> ApiResult<Vec<WanNetwork>>;

    /// Elements deployed at a site
    async fn query_elements(&self, site_id: &str) -> ApiResult<Vec<Element>>;

    async fn get_interfaces(&self, site_id: &str, element_id: &str) -> ApiResult<Vec<Interface>>;

    async fn get_wan_interfaces(&self, site_id: &str) -> ApiResult<Vec<WanInterface>>;

    async fn get_security_zones(&self) -> ApiResult<Vec<SecurityZone>>;

    /// QoS profiles of a configuration folder
    async fn get_qos_profiles(&self, folder: &str) -> ApiResult<Vec<QosProfile>>;

    async fn get_connections(&self, site_id: &str) -> ApiResult<Vec<SaseConnection>>;

    async fn create_connection(
        &self,
        site_id: &str,
        payload: &ConnectionPayload,
    ) -> ApiResult<SaseConnection>;

    /// Replace a connection with `connection`
    async fn update_connection(
        &self,
        site_id: &str,
        connection_id: &str,
        connection: &SaseConnection,
    ) -> ApiResult<SaseConnection>;

    async fn bind_zone(
        &self,
        site_id: &str,
        element_id: &str,
        binding: &ZoneBinding,
    ) -> ApiResult<serde_json::Value>;
}
