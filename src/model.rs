//! Remote resource models
//!
//! Data types matching the SASE management API responses, plus the payloads
//! this crate sends back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Interface tag marking service links created by the SASE integration.
pub const SERVICE_LINK_TAG: &str = "AUTO_PA_SDWAN_MANAGED";

/// Interface type carrying the overlay between an element and the edge.
pub const SERVICE_LINK_TYPE: &str = "service_link";

// ==========================================
// Edge locations and bandwidth
// ==========================================

/// Cloud security edge location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Location identifier
    pub value: String,
    #[serde(rename = "display")]
    pub display_name: String,
    pub aggregate_region: String,
    /// Fields we don't interpret
    #[serde(flatten)]
    pub raw_attributes: Map<String, Value>,
}

/// Bandwidth pool of an aggregate region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthAllocation {
    /// Aggregate region this allocation funds
    #[serde(rename = "name")]
    pub aggregate_region: String,
    /// First entry is the primary SPN
    #[serde(default)]
    pub spn_name_list: Vec<String>,
    #[serde(rename = "allocated_bandwidth", default)]
    pub allocated_bandwidth_mbps: f64,
}

impl BandwidthAllocation {
    /// Primary service processing node
    pub fn primary_spn(&self) -> Option<&str> {
        self.spn_name_list.first().map(String::as_str)
    }

    /// An allocation can carry tunnels only with bandwidth and an SPN
    pub fn is_funded(&self) -> bool {
        self.allocated_bandwidth_mbps > 0.0 && self.primary_spn().is_some()
    }
}

// ==========================================
// Sites, elements and interfaces
// ==========================================

/// Role of a site in the SD-WAN fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteRole {
    Spoke,
    Hub,
    #[serde(other)]
    Other,
}

/// SD-WAN site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(rename = "element_cluster_role")]
    pub role: SiteRole,
}

impl Site {
    pub fn is_spoke(&self) -> bool {
        self.role == SiteRole::Spoke
    }
}

/// WAN network a circuit attaches to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanNetwork {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub network_type: Option<String>,
}

/// ION element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site_id: Option<String>,
}

/// Element interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub interface_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub site_wan_interface_ids: Vec<String>,
}

impl Interface {
    /// Service link managed by the SASE integration
    pub fn is_managed_service_link(&self) -> bool {
        self.interface_type == SERVICE_LINK_TYPE && self.tags.iter().any(|t| t == SERVICE_LINK_TAG)
    }
}

/// Circuit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitType {
    PublicWan,
    PrivateWan,
    #[serde(other)]
    Other,
}

/// Site WAN interface as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanInterface {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub circuit_type: CircuitType,
    pub network_id: String,
}

/// Site WAN interface after naming and activity classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    pub id: String,
    pub name: String,
    pub circuit_type: CircuitType,
    pub network_id: String,
    /// Referenced by at least one element interface
    pub active: bool,
}

impl Circuit {
    /// Only active public circuits can carry a SASE tunnel
    pub fn is_eligible(&self) -> bool {
        self.active && self.circuit_type == CircuitType::PublicWan
    }
}

// ==========================================
// Zones and QoS
// ==========================================

/// Tenant-wide security zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityZone {
    pub id: String,
    pub name: String,
}

/// Remote network QoS profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QosProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl QosProfile {
    pub fn is_default(&self) -> bool {
        self.snippet.as_deref() == Some("default")
    }
}

// ==========================================
// SASE connections
// ==========================================

/// IPsec tunnel bound to one circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpsecTunnel {
    pub name: String,
    pub wan_interface_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IpsecTunnel {
    pub fn new(name: impl Into<String>, wan_interface_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wan_interface_id: wan_interface_id.into(),
            extra: Map::new(),
        }
    }
}

/// Group of tunnels terminating on one SPN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteNetworkGroup {
    pub name: String,
    #[serde(default)]
    pub ipsec_tunnels: Vec<IpsecTunnel>,
    #[serde(default)]
    pub spn_name: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// SASE connection of a site, as stored remotely
///
/// Unknown fields are kept so an update sends back what was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaseConnection {
    pub id: String,
    #[serde(default)]
    pub enabled_wan_interface_ids: Vec<String>,
    #[serde(default)]
    pub remote_network_groups: Vec<RemoteNetworkGroup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SaseConnection {
    /// Whether any circuit is still bound
    pub fn has_bindings(&self) -> bool {
        !self.enabled_wan_interface_ids.is_empty()
            || self.remote_network_groups.iter().any(|g| !g.ipsec_tunnels.is_empty())
    }

    /// Copy with every tunnel list and the enabled-circuit list emptied
    pub fn cleared(&self) -> Self {
        let mut conn = self.clone();
        conn.enabled_wan_interface_ids.clear();
        for group in &mut conn.remote_network_groups {
            group.ipsec_tunnels.clear();
        }
        conn
    }
}

/// Tunnel policy applied to every tunnel of a new connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelPolicy {
    pub anti_replay: bool,
    pub copy_tos: bool,
    pub enable_gre_encapsulation: bool,
    pub tunnel_monitoring: bool,
}

impl Default for TunnelPolicy {
    fn default() -> Self {
        Self {
            anti_replay: false,
            copy_tos: false,
            enable_gre_encapsulation: false,
            tunnel_monitoring: true,
        }
    }
}

/// Routing settings of a new connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfigs {
    pub advertise_default_route: bool,
    pub bgp_secret: Option<String>,
    pub export_routes: bool,
    pub summarize_mobile_routes_before_advertise: bool,
}

/// Desired state sent when creating a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPayload {
    pub enabled_wan_interface_ids: Vec<String>,
    pub ipsec_tunnel_configs: TunnelPolicy,
    pub is_active: bool,
    pub prismaaccess_edge_location: Vec<String>,
    pub prismaaccess_qos_cir_mbps: u32,
    pub prismaaccess_qos_profile_id: String,
    pub remote_network_groups: Vec<RemoteNetworkGroup>,
    pub routing_configs: RoutingConfigs,
}

/// Security zone binding of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBinding {
    pub zone_id: String,
    pub lannetwork_ids: Vec<String>,
    pub interface_ids: Vec<String>,
    pub wanoverlay_ids: Vec<String>,
    pub waninterface_ids: Vec<String>,
}

impl ZoneBinding {
    /// Binding of a zone to interfaces only
    pub fn interfaces(zone_id: impl Into<String>, interface_ids: Vec<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            lannetwork_ids: Vec::new(),
            interface_ids,
            wanoverlay_ids: Vec::new(),
            waninterface_ids: Vec::new(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
