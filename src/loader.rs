//! Topology loader
//!
//! Fetches the collections an action declares, in dependency order, and
//! builds the [`ResourceIndex`] the rest of the run reads from.

use tracing::{debug, info, warn};

use crate::action::{Action, ActionPlan, ResourceKind};
use crate::api::{ApiResult, SaseApi, REMOTE_NETWORKS_FOLDER};
use crate::index::ResourceIndex;
use crate::model::{Circuit, Site, WanInterface};
use crate::validate;
use crate::{Result, SaseError};

/// Builds a resource index from the remote API
pub struct TopologyLoader<'a, A: SaseApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: SaseApi + ?Sized> TopologyLoader<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Fetch everything `action` needs. The target site is resolved as soon
    /// as sites are indexed, so an unknown site aborts before any
    /// site-scoped call.
    pub async fn load(&self, action: Action, site_name: Option<&str>) -> Result<ResourceIndex> {
        let plan = action.plan();
        let mut index = ResourceIndex::new();
        let mut site: Option<Site> = None;

        info!("Building resource index for {}", action);
        for kind in plan.fetch_order() {
            if kind.is_site_scoped() && site.is_none() {
                continue;
            }

            info!("Fetching {}", kind);
            match self.fetch(kind, &mut index, site.as_ref()).await {
                Ok(()) => {}
                Err(e) if plan.is_required(kind) => {
                    return Err(SaseError::RemoteFetchFailed {
                        resource: kind,
                        source: e,
                    });
                }
                Err(e) => warn!("Could not retrieve {}, continuing without them: {}", kind, e),
            }

            if kind == ResourceKind::Sites && plan.needs_site() {
                let name = site_name.ok_or(SaseError::MissingArgument("sitename"))?;
                site = Some(validate::resolve_site(&index, name)?.clone());
            }
        }

        Self::log_summary(&plan, &index, site.as_ref());
        Ok(index)
    }

    async fn fetch(
        &self,
        kind: ResourceKind,
        index: &mut ResourceIndex,
        site: Option<&Site>,
    ) -> ApiResult<()> {
        let site_id = site.map(|s| s.id.as_str()).unwrap_or_default();

        match kind {
            ResourceKind::Locations => {
                for location in self.api.get_locations().await? {
                    index.add_location(location);
                }
            }
            ResourceKind::BandwidthAllocations => {
                for allocation in self.api.get_bandwidth_allocations().await? {
                    index.add_allocation(allocation);
                }
            }
            ResourceKind::Sites => {
                for site in self.api.get_sites().await? {
                    index.add_site(site);
                }
            }
            ResourceKind::WanNetworks => {
                for network in self.api.get_wan_networks().await? {
                    index.add_wan_network(network);
                }
            }
            ResourceKind::Elements => {
                for element in self.api.query_elements(site_id).await? {
                    index.add_element(site_id, element);
                }
            }
            ResourceKind::Interfaces => {
                let element_ids: Vec<String> = index
                    .elements_at(site_id)
                    .iter()
                    .map(|e| e.id.clone())
                    .collect();
                for element_id in element_ids {
                    let interfaces = self.api.get_interfaces(site_id, &element_id).await?;
                    debug!("Element {}: {} interfaces", element_id, interfaces.len());
                    index.add_interfaces(site_id, &element_id, interfaces);
                }
            }
            ResourceKind::WanInterfaces => {
                for wan_interface in self.api.get_wan_interfaces(site_id).await? {
                    let circuit = classify_circuit(index, site_id, wan_interface);
                    index.add_circuit(site_id, circuit);
                }
            }
            ResourceKind::SecurityZones => {
                for zone in self.api.get_security_zones().await? {
                    index.add_security_zone(zone);
                }
            }
            ResourceKind::QosProfiles => {
                for profile in self.api.get_qos_profiles(REMOTE_NETWORKS_FOLDER).await? {
                    index.add_qos_profile(profile);
                }
            }
            ResourceKind::Connections => {
                let connections = self.api.get_connections(site_id).await?;
                index.set_connections(site_id, connections);
            }
        }
        Ok(())
    }

    fn log_summary(plan: &ActionPlan, index: &ResourceIndex, site: Option<&Site>) {
        if plan.needs(ResourceKind::Locations) {
            debug!(
                "{} locations, {} funded",
                index.locations.len(),
                index.funded_locations().len()
            );
        }
        if let Some(site) = site {
            if let Some(circuits) = index.circuits_at(&site.id) {
                debug!(
                    "Site {}: eligible circuits {:?}, unbound circuits {:?}",
                    site.name,
                    circuits.eligible_names(),
                    circuits.inactive_names()
                );
            }
        }
    }
}

/// Name a WAN interface and decide whether any interface uses it
fn classify_circuit(index: &ResourceIndex, site_id: &str, wan_interface: WanInterface) -> Circuit {
    let name = match wan_interface.name {
        Some(name) if !name.is_empty() => name,
        _ => match index.wan_networks.by_id(&wan_interface.network_id) {
            Some(network) => format!("Circuit to {}", network.name),
            None => {
                warn!(
                    "WAN interface {} references unknown WAN network {}",
                    wan_interface.id, wan_interface.network_id
                );
                format!("Circuit to {}", wan_interface.network_id)
            }
        },
    };

    Circuit {
        active: index.is_circuit_referenced(site_id, &wan_interface.id),
        id: wan_interface.id,
        name,
        circuit_type: wan_interface.circuit_type,
        network_id: wan_interface.network_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{branch_tenant, port, wan_interface, Call};
    use crate::model::CircuitType;

    #[tokio::test]
    async fn test_list_fetches_only_locations_and_bandwidth() {
        let api = branch_tenant();
        let index = TopologyLoader::new(&api)
            .load(Action::ListLocations, None)
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![Call::Fetch("locations"), Call::Fetch("bandwidth_allocations")]
        );
        assert_eq!(index.locations.len(), 3);
        assert!(index.sites.is_empty());
    }

    #[tokio::test]
    async fn test_config_classifies_circuits() {
        let api = branch_tenant();
        let index = TopologyLoader::new(&api)
            .load(Action::ConfigConnection, Some("Branch-12"))
            .await
            .unwrap();

        let circuits = index.circuits_at("s-12").unwrap();
        assert_eq!(circuits.eligible_names(), vec!["INET1".to_string(), "INET2".to_string()]);
        assert_eq!(circuits.inactive_names(), vec!["LTE".to_string()]);
        // unnamed private circuit takes its network's name
        assert!(circuits.active.by_name("Circuit to MPLS Core").is_some());
        assert_eq!(index.service_links("e1").len(), 2);
        assert!(index.service_links("e2").is_empty());
        assert!(index.default_qos_profile().is_some());
    }

    #[tokio::test]
    async fn test_unnamed_circuit_on_unknown_network() {
        let mut api = branch_tenant();
        api.wan_interfaces.get_mut("s-12").unwrap().push(wan_interface(
            "w-orphan",
            None,
            CircuitType::PublicWan,
            "n-missing",
        ));
        api.interfaces
            .get_mut("e2")
            .unwrap()
            .push(port("e2-2", &["w-orphan"]));

        let index = TopologyLoader::new(&api)
            .load(Action::ConfigConnection, Some("Branch-12"))
            .await
            .unwrap();

        let circuits = index.circuits_at("s-12").unwrap();
        let orphan = circuits.active.by_name("Circuit to n-missing").unwrap();
        assert_eq!(orphan.id, "w-orphan");
        assert!(orphan.is_eligible());
    }

    #[tokio::test]
    async fn test_unknown_site_stops_before_site_calls() {
        let api = branch_tenant();
        let err = TopologyLoader::new(&api)
            .load(Action::ConfigConnection, Some("Nowhere"))
            .await
            .unwrap_err();

        match err {
            SaseError::UnknownSite { valid, .. } => {
                assert_eq!(valid, vec!["Branch-12".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!api.calls().contains(&Call::Fetch("elements")));
    }

    #[tokio::test]
    async fn test_hub_site_is_not_a_target() {
        let api = branch_tenant();
        let result = TopologyLoader::new(&api)
            .load(Action::DeleteConnection, Some("DC-1"))
            .await;
        assert!(matches!(result, Err(SaseError::UnknownSite { .. })));
    }

    #[tokio::test]
    async fn test_required_fetch_failure_is_fatal() {
        let api = branch_tenant().fail("elements");
        let err = TopologyLoader::new(&api)
            .load(Action::BindZone, Some("Branch-12"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SaseError::RemoteFetchFailed {
                resource: ResourceKind::Elements,
                ..
            }
        ));
        assert!(!api.calls().contains(&Call::Fetch("security_zones")));
    }

    #[tokio::test]
    async fn test_optional_fetch_failure_is_empty() {
        let api = branch_tenant().fail("wan_interfaces");
        let index = TopologyLoader::new(&api)
            .load(Action::BindZone, Some("Branch-12"))
            .await;

        let index = tokio_test::assert_ok!(index);
        assert!(index.circuits_at("s-12").is_none());
        assert_eq!(index.security_zones.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_loads_connections() {
        let mut api = branch_tenant();
        api.connections.insert(
            "s-12".into(),
            vec![serde_json::from_value(serde_json::json!({"id": "c1"})).unwrap()],
        );
        let index = TopologyLoader::new(&api)
            .load(Action::DeleteConnection, Some("Branch-12"))
            .await
            .unwrap();

        assert_eq!(index.connections_at("s-12").len(), 1);
        assert_eq!(
            api.calls(),
            vec![Call::Fetch("sites"), Call::Fetch("connections")]
        );
    }
}
