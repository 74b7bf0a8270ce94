//! Resource index
//!
//! Cross-referenced snapshot of the remote inventory, built once per
//! invocation by the [`loader`](crate::loader) and only read afterwards.
//!
//! Names are unique only within their resource kind. The API is expected to
//! return each resource at most once per fetch; if two resources share a
//! name, the later one is authoritative for name lookups and a warning is
//! logged.

use std::collections::HashMap;

use tracing::warn;

use crate::model::{
    BandwidthAllocation, Circuit, Element, Interface, Location, QosProfile, SaseConnection,
    SecurityZone, Site, WanNetwork,
};

/// Bidirectional id/name lookup for one resource kind
#[derive(Debug, Clone)]
pub struct NameMap<T> {
    by_id: HashMap<String, T>,
    id_to_name: HashMap<String, String>,
    name_to_id: HashMap<String, String>,
    /// Insertion order of ids
    order: Vec<String>,
}

impl<T> Default for NameMap<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            id_to_name: HashMap::new(),
            name_to_id: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> NameMap<T> {
    pub fn insert(&mut self, id: &str, name: &str, entity: T) {
        if let Some(previous) = self.name_to_id.get(name) {
            if previous != id {
                warn!("Duplicate name {:?} ({} and {}), keeping {}", name, previous, id, id);
            }
        }
        if let Some(old_name) = self.id_to_name.get(id) {
            if old_name != name && self.name_to_id.get(old_name).map(String::as_str) == Some(id) {
                self.name_to_id.remove(old_name);
            }
        }
        if self.by_id.insert(id.to_string(), entity).is_some() {
            warn!("Resource {} returned twice, keeping the later one", id);
        } else {
            self.order.push(id.to_string());
        }
        self.id_to_name.insert(id.to_string(), name.to_string());
        self.name_to_id.insert(name.to_string(), id.to_string());
    }

    pub fn by_id(&self, id: &str) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.name_to_id.get(name).and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Entities in fetch order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Name of an id, as last recorded
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    /// Names that resolve, in fetch order
    pub fn names(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|id| {
                let name = self.id_to_name.get(id)?;
                (self.name_to_id.get(name) == Some(id)).then(|| name.clone())
            })
            .collect()
    }
}

/// Circuits of one site, split by eligibility
#[derive(Debug, Clone, Default)]
pub struct SiteCircuits {
    /// Active circuits; names are unique among these
    pub active: NameMap<Circuit>,
    /// Ids of active public circuits, in fetch order
    pub eligible: Vec<String>,
    /// Circuits no interface references
    pub inactive: Vec<Circuit>,
}

impl SiteCircuits {
    pub fn eligible_names(&self) -> Vec<String> {
        self.eligible
            .iter()
            .filter_map(|id| self.active.by_id(id))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn inactive_names(&self) -> Vec<String> {
        self.inactive.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_inactive(&self, name: &str) -> bool {
        self.inactive.iter().any(|c| c.name == name)
    }
}

/// Snapshot of every collection fetched for an action
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    pub locations: NameMap<Location>,
    pub sites: NameMap<Site>,
    pub wan_networks: NameMap<WanNetwork>,
    pub elements: NameMap<Element>,
    pub security_zones: NameMap<SecurityZone>,
    pub qos_profiles: NameMap<QosProfile>,
    allocations_by_region: HashMap<String, BandwidthAllocation>,
    /// Regions in allocation fetch order
    allocation_regions: Vec<String>,
    locations_by_region: HashMap<String, Vec<String>>,
    elements_by_site: HashMap<String, Vec<String>>,
    service_links_by_element: HashMap<String, Vec<Interface>>,
    referenced_circuits_by_site: HashMap<String, Vec<String>>,
    circuits_by_site: HashMap<String, SiteCircuits>,
    connections_by_site: HashMap<String, Vec<SaseConnection>>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // Population
    // ==========================================

    pub fn add_location(&mut self, location: Location) {
        let region = self
            .locations_by_region
            .entry(location.aggregate_region.clone())
            .or_default();
        if !region.contains(&location.value) {
            region.push(location.value.clone());
        }
        let (id, name) = (location.value.clone(), location.display_name.clone());
        self.locations.insert(&id, &name, location);
    }

    pub fn add_allocation(&mut self, allocation: BandwidthAllocation) {
        let region = allocation.aggregate_region.clone();
        if !self.locations_by_region.contains_key(&region) {
            warn!("Bandwidth allocated to region {} with no known locations", region);
        }
        if self.allocations_by_region.insert(region.clone(), allocation).is_some() {
            warn!("Region {} allocated twice, keeping the later allocation", region);
        } else {
            self.allocation_regions.push(region);
        }
    }

    pub fn add_site(&mut self, site: Site) {
        let (id, name) = (site.id.clone(), site.name.clone());
        self.sites.insert(&id, &name, site);
    }

    pub fn add_wan_network(&mut self, network: WanNetwork) {
        let (id, name) = (network.id.clone(), network.name.clone());
        self.wan_networks.insert(&id, &name, network);
    }

    pub fn add_element(&mut self, site_id: &str, element: Element) {
        let ids = self.elements_by_site.entry(site_id.to_string()).or_default();
        if !ids.contains(&element.id) {
            ids.push(element.id.clone());
        }
        let (id, name) = (element.id.clone(), element.name.clone());
        self.elements.insert(&id, &name, element);
    }

    /// Record an element's interfaces: managed service links are kept for
    /// zone binding, WAN references mark circuits as active.
    pub fn add_interfaces(&mut self, site_id: &str, element_id: &str, interfaces: Vec<Interface>) {
        let referenced = self
            .referenced_circuits_by_site
            .entry(site_id.to_string())
            .or_default();
        for intf in &interfaces {
            for circuit_id in &intf.site_wan_interface_ids {
                if !referenced.contains(circuit_id) {
                    referenced.push(circuit_id.clone());
                }
            }
        }

        let links = interfaces
            .into_iter()
            .filter(Interface::is_managed_service_link)
            .collect();
        self.service_links_by_element
            .insert(element_id.to_string(), links);
    }

    /// Whether any interface at the site references the circuit
    pub fn is_circuit_referenced(&self, site_id: &str, circuit_id: &str) -> bool {
        self.referenced_circuits_by_site
            .get(site_id)
            .map_or(false, |ids| ids.iter().any(|id| id == circuit_id))
    }

    pub fn add_circuit(&mut self, site_id: &str, circuit: Circuit) {
        let circuits = self.circuits_by_site.entry(site_id.to_string()).or_default();
        if !circuit.active {
            circuits.inactive.push(circuit);
            return;
        }
        if circuit.is_eligible() && !circuits.eligible.contains(&circuit.id) {
            circuits.eligible.push(circuit.id.clone());
        }
        let (id, name) = (circuit.id.clone(), circuit.name.clone());
        circuits.active.insert(&id, &name, circuit);
    }

    pub fn add_security_zone(&mut self, zone: SecurityZone) {
        let (id, name) = (zone.id.clone(), zone.name.clone());
        self.security_zones.insert(&id, &name, zone);
    }

    pub fn add_qos_profile(&mut self, profile: QosProfile) {
        let (id, name) = (profile.id.clone(), profile.name.clone());
        self.qos_profiles.insert(&id, &name, profile);
    }

    pub fn set_connections(&mut self, site_id: &str, connections: Vec<SaseConnection>) {
        self.connections_by_site
            .insert(site_id.to_string(), connections);
    }

    // ==========================================
    // Lookups
    // ==========================================

    pub fn allocation_for_region(&self, region: &str) -> Option<&BandwidthAllocation> {
        self.allocations_by_region.get(region)
    }

    /// Allocation a location inherits from its region
    pub fn allocation_for(&self, location: &Location) -> Option<&BandwidthAllocation> {
        self.allocation_for_region(&location.aggregate_region)
    }

    pub fn is_funded(&self, location: &Location) -> bool {
        self.allocation_for(location)
            .map_or(false, BandwidthAllocation::is_funded)
    }

    /// Regions with an allocation, in fetch order
    pub fn allocation_regions(&self) -> &[String] {
        &self.allocation_regions
    }

    pub fn locations_in_region(&self, region: &str) -> Vec<&Location> {
        self.locations_by_region
            .get(region)
            .map(|ids| ids.iter().filter_map(|id| self.locations.by_id(id)).collect())
            .unwrap_or_default()
    }

    /// Locations that can carry a connection, grouped by region order
    pub fn funded_locations(&self) -> Vec<&Location> {
        self.allocation_regions
            .iter()
            .filter(|r| {
                self.allocation_for_region(r)
                    .map_or(false, BandwidthAllocation::is_funded)
            })
            .flat_map(|r| self.locations_in_region(r))
            .collect()
    }

    /// Spoke site names, the only valid connection targets
    pub fn spoke_site_names(&self) -> Vec<String> {
        self.sites
            .iter()
            .filter(|s| s.is_spoke())
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn elements_at(&self, site_id: &str) -> Vec<&Element> {
        self.elements_by_site
            .get(site_id)
            .map(|ids| ids.iter().filter_map(|id| self.elements.by_id(id)).collect())
            .unwrap_or_default()
    }

    /// Managed service links of an element
    pub fn service_links(&self, element_id: &str) -> &[Interface] {
        self.service_links_by_element
            .get(element_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn circuits_at(&self, site_id: &str) -> Option<&SiteCircuits> {
        self.circuits_by_site.get(site_id)
    }

    pub fn connections_at(&self, site_id: &str) -> &[SaseConnection] {
        self.connections_by_site
            .get(site_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The tenant's remote-network QoS profile marked as default
    pub fn default_qos_profile(&self) -> Option<&QosProfile> {
        self.qos_profiles.iter().find(|p| p.is_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{allocation, location, qos, site};
    use crate::model::{CircuitType, SiteRole};

    fn circuit(id: &str, name: &str, circuit_type: CircuitType, active: bool) -> Circuit {
        Circuit {
            id: id.into(),
            name: name.into(),
            circuit_type,
            network_id: "n1".into(),
            active,
        }
    }

    #[test]
    fn test_name_map_lookups() {
        let mut index = ResourceIndex::new();
        index.add_site(site("s1", "Branch", SiteRole::Spoke));
        index.add_site(site("s2", "DC", SiteRole::Hub));

        assert_eq!(index.sites.by_name("Branch").unwrap().id, "s1");
        assert_eq!(index.sites.by_id("s2").unwrap().name, "DC");
        assert!(index.sites.by_name("Nowhere").is_none());
        assert_eq!(index.spoke_site_names(), vec!["Branch".to_string()]);
    }

    #[test]
    fn test_duplicate_name_later_wins() {
        let mut index = ResourceIndex::new();
        index.add_site(site("s1", "Branch", SiteRole::Spoke));
        index.add_site(site("s2", "Branch", SiteRole::Spoke));

        assert_eq!(index.sites.by_name("Branch").unwrap().id, "s2");
        // both ids stay reachable
        assert!(index.sites.by_id("s1").is_some());
        assert_eq!(index.sites.len(), 2);
    }

    #[test]
    fn test_renamed_id_drops_old_name() {
        let mut index = ResourceIndex::new();
        index.add_site(site("s1", "Old", SiteRole::Spoke));
        index.add_site(site("s1", "New", SiteRole::Spoke));

        assert!(index.sites.by_name("Old").is_none());
        assert_eq!(index.sites.by_name("New").unwrap().id, "s1");
        assert_eq!(index.sites.names(), vec!["New".to_string()]);
        assert_eq!(index.sites.len(), 1);
    }

    #[test]
    fn test_rename_keeps_name_claimed_by_other_id() {
        let mut index = ResourceIndex::new();
        index.add_site(site("s1", "Branch", SiteRole::Spoke));
        index.add_site(site("s2", "Branch", SiteRole::Spoke));
        index.add_site(site("s1", "Renamed", SiteRole::Spoke));

        assert_eq!(index.sites.by_name("Branch").unwrap().id, "s2");
        assert_eq!(index.sites.by_name("Renamed").unwrap().id, "s1");
    }

    #[test]
    fn test_locations_grouped_by_region() {
        let mut index = ResourceIndex::new();
        index.add_location(location("l1", "US East", "AMER"));
        index.add_location(location("l2", "US West", "AMER"));
        index.add_location(location("l3", "Frankfurt", "EMEA"));
        index.add_allocation(allocation("EMEA", &[], 0.0));
        index.add_allocation(allocation("AMER", &["spn-1"], 50.0));

        assert_eq!(index.locations_in_region("AMER").len(), 2);
        assert_eq!(index.allocation_regions(), &["EMEA".to_string(), "AMER".to_string()]);

        let frankfurt = index.locations.by_name("Frankfurt").unwrap();
        assert!(!index.is_funded(frankfurt));
        let funded: Vec<_> = index.funded_locations().iter().map(|l| l.value.clone()).collect();
        assert_eq!(funded, vec!["l1", "l2"]);
    }

    #[test]
    fn test_circuit_classification() {
        let mut index = ResourceIndex::new();
        index.add_circuit("s1", circuit("w1", "INET1", CircuitType::PublicWan, true));
        index.add_circuit("s1", circuit("w2", "MPLS", CircuitType::PrivateWan, true));
        index.add_circuit("s1", circuit("w3", "INET1", CircuitType::PublicWan, false));

        let circuits = index.circuits_at("s1").unwrap();
        assert_eq!(circuits.eligible_names(), vec!["INET1".to_string()]);
        assert_eq!(circuits.active.len(), 2);
        assert!(circuits.is_inactive("INET1"));
        // inactive circuit does not shadow the active one
        assert_eq!(circuits.active.by_name("INET1").unwrap().id, "w1");
    }

    #[test]
    fn test_default_qos_profile() {
        let mut index = ResourceIndex::new();
        index.add_qos_profile(qos("q1", "Gold", Some("shared")));
        assert!(index.default_qos_profile().is_none());

        index.add_qos_profile(qos("q2", "Default", Some("default")));
        assert_eq!(index.default_qos_profile().unwrap().id, "q2");
    }

    #[test]
    fn test_service_links_and_references() {
        use crate::api::fake::{port, service_link};

        let mut index = ResourceIndex::new();
        index.add_interfaces(
            "s1",
            "e1",
            vec![port("p1", &["w1", "w2"]), service_link("sl1", "sl-1")],
        );

        assert_eq!(index.service_links("e1").len(), 1);
        assert!(index.service_links("e2").is_empty());
        assert!(index.is_circuit_referenced("s1", "w2"));
        assert!(!index.is_circuit_referenced("s1", "w3"));
    }
}
