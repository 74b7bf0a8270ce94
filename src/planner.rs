//! Connection planning
//!
//! Derives the deterministic names and the desired-state payload of a new
//! SASE connection.
//!
//! Naming:
//! - remote network group: `{site}_{primary spn}`
//! - tunnel: `{site}_{circuit}_{location}_tunnel_{n}`, `n` counting from 1 in
//!   the order the circuits were requested
//!
//! Site, circuit and location names are normalized with [`normalize_name`].

use serde::Serialize;
use serde_json::Map;

use crate::index::ResourceIndex;
use crate::model::{
    ConnectionPayload, IpsecTunnel, Location, RemoteNetworkGroup, RoutingConfigs, Site,
    TunnelPolicy,
};
use crate::{Result, SaseError};

/// Committed bandwidth requested for every new connection
pub const MIN_COMMITTED_BANDWIDTH_MBPS: u32 = 1;

/// Strip whitespace and hyphens
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Everything needed to create one connection
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionPlan {
    pub site_id: String,
    pub site_name: String,
    pub location: String,
    pub location_display_name: String,
    pub spn_name: String,
    pub allocated_bandwidth_mbps: f64,
    pub group_name: String,
    pub tunnel_names: Vec<String>,
    pub payload: ConnectionPayload,
}

/// Builds connection payloads from the resource index
pub struct ConnectionPlanner<'a> {
    index: &'a ResourceIndex,
}

impl<'a> ConnectionPlanner<'a> {
    pub fn new(index: &'a ResourceIndex) -> Self {
        Self { index }
    }

    /// Plan a connection of `circuit_ids` at `site` to `location`
    pub fn plan(
        &self,
        site: &Site,
        circuit_ids: &[String],
        location: &Location,
    ) -> Result<ConnectionPlan> {
        let qos_profile = self
            .index
            .default_qos_profile()
            .ok_or(SaseError::NoDefaultQosProfile)?;

        let funded = || SaseError::LocationUnfunded {
            location: location.display_name.clone(),
            valid: self
                .index
                .funded_locations()
                .iter()
                .map(|l| l.display_name.clone())
                .collect(),
        };
        let allocation = self
            .index
            .allocation_for(location)
            .filter(|a| a.is_funded())
            .ok_or_else(funded)?;
        let spn_name = allocation.primary_spn().ok_or_else(funded)?.to_string();

        let circuits = self.index.circuits_at(&site.id);
        let site_name = normalize_name(&site.name);
        let location_name = normalize_name(&location.display_name);

        let mut tunnels = Vec::with_capacity(circuit_ids.len());
        for (seq, circuit_id) in circuit_ids.iter().enumerate() {
            let circuit_name = circuits
                .and_then(|c| c.active.name_of(circuit_id))
                .ok_or_else(|| SaseError::CircuitUnknown {
                    circuit: circuit_id.clone(),
                    site: site.name.clone(),
                    valid: circuits.map(|c| c.eligible_names()).unwrap_or_default(),
                })?;

            let name = format!(
                "{}_{}_{}_tunnel_{}",
                site_name,
                normalize_name(circuit_name),
                location_name,
                seq + 1
            );
            tunnels.push(IpsecTunnel::new(name, circuit_id.clone()));
        }

        let group_name = format!("{}_{}", site_name, spn_name);
        let tunnel_names = tunnels.iter().map(|t| t.name.clone()).collect();

        let payload = ConnectionPayload {
            enabled_wan_interface_ids: circuit_ids.to_vec(),
            ipsec_tunnel_configs: TunnelPolicy::default(),
            is_active: true,
            prismaaccess_edge_location: vec![location.value.clone()],
            prismaaccess_qos_cir_mbps: MIN_COMMITTED_BANDWIDTH_MBPS,
            prismaaccess_qos_profile_id: qos_profile.id.clone(),
            remote_network_groups: vec![RemoteNetworkGroup {
                name: group_name.clone(),
                ipsec_tunnels: tunnels,
                spn_name: vec![spn_name.clone()],
                extra: Map::new(),
            }],
            routing_configs: RoutingConfigs::default(),
        };

        Ok(ConnectionPlan {
            site_id: site.id.clone(),
            site_name: site.name.clone(),
            location: location.value.clone(),
            location_display_name: location.display_name.clone(),
            spn_name,
            allocated_bandwidth_mbps: allocation.allocated_bandwidth_mbps,
            group_name,
            tunnel_names,
            payload,
        })
    }
}
