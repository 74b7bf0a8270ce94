//! In-memory API for tests

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map};

use super::{ApiError, ApiResult, SaseApi};
use crate::model::*;

/// Recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(&'static str),
    Create {
        site_id: String,
        payload: ConnectionPayload,
    },
    Update {
        site_id: String,
        connection: SaseConnection,
    },
    Bind {
        site_id: String,
        element_id: String,
        binding: ZoneBinding,
    },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::Fetch(_))
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub locations: Vec<Location>,
    pub allocations: Vec<BandwidthAllocation>,
    pub sites: Vec<Site>,
    pub wan_networks: Vec<WanNetwork>,
    pub elements: HashMap<String, Vec<Element>>,
    pub interfaces: HashMap<String, Vec<Interface>>,
    pub wan_interfaces: HashMap<String, Vec<WanInterface>>,
    pub zones: Vec<SecurityZone>,
    pub qos_profiles: Vec<QosProfile>,
    pub connections: HashMap<String, Vec<SaseConnection>>,
    /// Operations that answer with a 500
    pub failing: HashSet<&'static str>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn fail(mut self, op: &'static str) -> Self {
        self.failing.insert(op);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    fn record(&self, op: &'static str, call: Call) -> ApiResult<()> {
        self.record_scoped(op, None, call)
    }

    /// `op:scope` in `failing` fails only calls for that scope
    fn record_scoped(&self, op: &'static str, scope: Option<&str>, call: Call) -> ApiResult<()> {
        self.calls.lock().push(call);
        let scoped = scope.map_or(false, |s| {
            self.failing.contains(format!("{}:{}", op, s).as_str())
        });
        if scoped || self.failing.contains(op) {
            return Err(ApiError::Status {
                status: 500,
                body: format!("{} unavailable", op),
            });
        }
        Ok(())
    }

    fn fetch(&self, op: &'static str) -> ApiResult<()> {
        self.record(op, Call::Fetch(op))
    }
}

#[async_trait]
impl SaseApi for FakeApi {
    async fn get_locations(&self) -> ApiResult<Vec<Location>> {
        self.fetch("locations")?;
        Ok(self.locations.clone())
    }

    async fn get_bandwidth_allocations(&self) -> ApiResult<Vec<BandwidthAllocation>> {
        self.fetch("bandwidth_allocations")?;
        Ok(self.allocations.clone())
    }

    async fn get_sites(&self) -> ApiResult<Vec<Site>> {
        self.fetch("sites")?;
        Ok(self.sites.clone())
    }

    async fn get_wan_networks(&self) -> ApiResult<Vec<WanNetwork>> {
        self.fetch("wan_networks")?;
        Ok(self.wan_networks.clone())
    }

    async fn query_elements(&self, site_id: &str) -> ApiResult<Vec<Element>> {
        self.fetch("elements")?;
        Ok(self.elements.get(site_id).cloned().unwrap_or_default())
    }

    async fn get_interfaces(&self, _site_id: &str, element_id: &str) -> ApiResult<Vec<Interface>> {
        self.fetch("interfaces")?;
        Ok(self.interfaces.get(element_id).cloned().unwrap_or_default())
    }

    async fn get_wan_interfaces(&self, site_id: &str) -> ApiResult<Vec<WanInterface>> {
        self.fetch("wan_interfaces")?;
        Ok(self.wan_interfaces.get(site_id).cloned().unwrap_or_default())
    }

    async fn get_security_zones(&self) -> ApiResult<Vec<SecurityZone>> {
        self.fetch("security_zones")?;
        Ok(self.zones.clone())
    }

    async fn get_qos_profiles(&self, _folder: &str) -> ApiResult<Vec<QosProfile>> {
        self.fetch("qos_profiles")?;
        Ok(self.qos_profiles.clone())
    }

    async fn get_connections(&self, site_id: &str) -> ApiResult<Vec<SaseConnection>> {
        self.fetch("connections")?;
        Ok(self.connections.get(site_id).cloned().unwrap_or_default())
    }

    async fn create_connection(
        &self,
        site_id: &str,
        payload: &ConnectionPayload,
    ) -> ApiResult<SaseConnection> {
        self.record(
            "create_connection",
            Call::Create {
                site_id: site_id.to_string(),
                payload: payload.clone(),
            },
        )?;
        Ok(SaseConnection {
            id: "conn-new".into(),
            enabled_wan_interface_ids: payload.enabled_wan_interface_ids.clone(),
            remote_network_groups: payload.remote_network_groups.clone(),
            extra: Map::new(),
        })
    }

    async fn update_connection(
        &self,
        site_id: &str,
        _connection_id: &str,
        connection: &SaseConnection,
    ) -> ApiResult<SaseConnection> {
        self.record(
            "update_connection",
            Call::Update {
                site_id: site_id.to_string(),
                connection: connection.clone(),
            },
        )?;
        Ok(connection.clone())
    }

    async fn bind_zone(
        &self,
        site_id: &str,
        element_id: &str,
        binding: &ZoneBinding,
    ) -> ApiResult<serde_json::Value> {
        self.record_scoped(
            "bind_zone",
            Some(element_id),
            Call::Bind {
                site_id: site_id.to_string(),
                element_id: element_id.to_string(),
                binding: binding.clone(),
            },
        )?;
        Ok(json!({ "id": format!("binding-{}", element_id) }))
    }
}

// ==========================================
// Fixtures
// ==========================================

pub fn location(value: &str, display: &str, region: &str) -> Location {
    Location {
        value: value.into(),
        display_name: display.into(),
        aggregate_region: region.into(),
        raw_attributes: Map::new(),
    }
}

pub fn allocation(region: &str, spns: &[&str], mbps: f64) -> BandwidthAllocation {
    BandwidthAllocation {
        aggregate_region: region.into(),
        spn_name_list: spns.iter().map(|s| s.to_string()).collect(),
        allocated_bandwidth_mbps: mbps,
    }
}

pub fn site(id: &str, name: &str, role: SiteRole) -> Site {
    Site {
        id: id.into(),
        name: name.into(),
        role,
    }
}

pub fn element(id: &str, name: &str, site_id: &str) -> Element {
    Element {
        id: id.into(),
        name: name.into(),
        site_id: Some(site_id.into()),
    }
}

pub fn port(id: &str, circuit_ids: &[&str]) -> Interface {
    Interface {
        id: id.into(),
        name: id.into(),
        interface_type: "port".into(),
        tags: Vec::new(),
        site_wan_interface_ids: circuit_ids.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn service_link(id: &str, name: &str) -> Interface {
    Interface {
        id: id.into(),
        name: name.into(),
        interface_type: SERVICE_LINK_TYPE.into(),
        tags: vec![SERVICE_LINK_TAG.into()],
        site_wan_interface_ids: Vec::new(),
    }
}

pub fn wan_interface(
    id: &str,
    name: Option<&str>,
    circuit_type: CircuitType,
    network_id: &str,
) -> WanInterface {
    WanInterface {
        id: id.into(),
        name: name.map(String::from),
        circuit_type,
        network_id: network_id.into(),
    }
}

pub fn qos(id: &str, name: &str, snippet: Option<&str>) -> QosProfile {
    QosProfile {
        id: id.into(),
        name: name.into(),
        snippet: snippet.map(String::from),
    }
}

pub fn zone(id: &str, name: &str) -> SecurityZone {
    SecurityZone {
        id: id.into(),
        name: name.into(),
    }
}

/// Tenant with spoke site "Branch-12" (circuits INET1, INET2 active and public,
/// MPLS active and private, LTE unbound), hub "DC-1", locations "US East"
/// (funded AMER region) and "Frankfurt" (unfunded EMEA region), one default
/// QoS profile and zones "trust"/"untrust".
pub fn branch_tenant() -> FakeApi {
    let mut api = FakeApi {
        locations: vec![
            location("us-east-1", "US East", "AMER"),
            location("us-west-1", "US West", "AMER"),
            location("eu-central-1", "Frankfurt", "EMEA"),
        ],
        allocations: vec![
            allocation("AMER", &["spn-amer-1", "spn-amer-2"], 100.0),
            allocation("EMEA", &[], 0.0),
        ],
        sites: vec![
            site("s-12", "Branch-12", SiteRole::Spoke),
            site("s-dc", "DC-1", SiteRole::Hub),
        ],
        wan_networks: vec![
            WanNetwork {
                id: "n-inet".into(),
                name: "Internet".into(),
                network_type: Some("publicwan".into()),
            },
            WanNetwork {
                id: "n-mpls".into(),
                name: "MPLS Core".into(),
                network_type: Some("privatewan".into()),
            },
        ],
        zones: vec![zone("z-trust", "trust"), zone("z-untrust", "untrust")],
        qos_profiles: vec![
            qos("q-custom", "Gold", Some("shared")),
            qos("q-default", "Default RN", Some("default")),
        ],
        ..Default::default()
    };

    api.elements.insert(
        "s-12".into(),
        vec![element("e1", "ion-1", "s-12"), element("e2", "ion-2", "s-12")],
    );
    api.interfaces.insert(
        "e1".into(),
        vec![
            port("e1-1", &["w-inet1"]),
            port("e1-2", &["w-mpls"]),
            service_link("e1-sl1", "sl-inet1"),
            service_link("e1-sl2", "sl-inet2"),
        ],
    );
    api.interfaces
        .insert("e2".into(), vec![port("e2-1", &["w-inet2"])]);
    api.wan_interfaces.insert(
        "s-12".into(),
        vec![
            wan_interface("w-inet1", Some("INET1"), CircuitType::PublicWan, "n-inet"),
            wan_interface("w-inet2", Some("INET2"), CircuitType::PublicWan, "n-inet"),
            wan_interface("w-mpls", None, CircuitType::PrivateWan, "n-mpls"),
            wan_interface("w-lte", Some("LTE"), CircuitType::PublicWan, "n-inet"),
        ],
    );
    api
}
