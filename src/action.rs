//! Actions and their declarative requirements

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::{Result, SaseError};

/// Wildcard selecting every eligible circuit at a site
pub const ALL_CIRCUITS: &str = "ALL";

/// Operator action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Action {
    /// List edge locations with allocated bandwidth
    #[value(name = "list_palocations")]
    ListLocations,
    /// Unbind every circuit from the site's SASE connections
    #[value(name = "delete_saseconn")]
    DeleteConnection,
    /// Create a SASE connection for the site
    #[value(name = "config_saseconn")]
    ConfigConnection,
    /// Bind a security zone to the site's service links
    #[value(name = "bind_zone")]
    BindZone,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::ListLocations,
        Action::DeleteConnection,
        Action::ConfigConnection,
        Action::BindZone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ListLocations => "list_palocations",
            Action::DeleteConnection => "delete_saseconn",
            Action::ConfigConnection => "config_saseconn",
            Action::BindZone => "bind_zone",
        }
    }

    /// What this action fetches and checks
    pub fn plan(&self) -> ActionPlan {
        use Check::*;
        use ResourceKind::*;

        match self {
            Action::ListLocations => ActionPlan {
                required: &[Locations, BandwidthAllocations],
                optional: &[],
                checks: &[BandwidthAvailable],
            },
            Action::ConfigConnection => ActionPlan {
                required: &[
                    Locations,
                    BandwidthAllocations,
                    Sites,
                    WanNetworks,
                    Elements,
                    Interfaces,
                    WanInterfaces,
                    QosProfiles,
                ],
                optional: &[Connections],
                checks: &[Site, Circuits, Location, BandwidthAvailable],
            },
            Action::DeleteConnection => ActionPlan {
                required: &[Sites, Connections],
                optional: &[],
                checks: &[Site],
            },
            Action::BindZone => ActionPlan {
                required: &[Sites, WanNetworks, Elements, Interfaces, SecurityZones],
                optional: &[WanInterfaces],
                checks: &[Site, Zone],
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote resource collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResourceKind {
    Locations,
    BandwidthAllocations,
    Sites,
    WanNetworks,
    Elements,
    Interfaces,
    WanInterfaces,
    SecurityZones,
    QosProfiles,
    Connections,
}

impl ResourceKind {
    /// Fetch order. Bandwidth rows group indexed locations, site-scoped
    /// collections need the site id, interfaces are per element and unnamed
    /// WAN interfaces take their WAN network's name.
    pub const LOAD_ORDER: [ResourceKind; 10] = [
        ResourceKind::Locations,
        ResourceKind::BandwidthAllocations,
        ResourceKind::Sites,
        ResourceKind::WanNetworks,
        ResourceKind::Elements,
        ResourceKind::Interfaces,
        ResourceKind::WanInterfaces,
        ResourceKind::SecurityZones,
        ResourceKind::QosProfiles,
        ResourceKind::Connections,
    ];

    /// Scoped to the target site
    pub fn is_site_scoped(&self) -> bool {
        matches!(
            self,
            ResourceKind::Elements
                | ResourceKind::Interfaces
                | ResourceKind::WanInterfaces
                | ResourceKind::Connections
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Locations => "edge locations",
            ResourceKind::BandwidthAllocations => "bandwidth allocations",
            ResourceKind::Sites => "sites",
            ResourceKind::WanNetworks => "WAN networks",
            ResourceKind::Elements => "elements",
            ResourceKind::Interfaces => "interfaces",
            ResourceKind::WanInterfaces => "site WAN interfaces",
            ResourceKind::SecurityZones => "security zones",
            ResourceKind::QosProfiles => "remote network QoS profiles",
            ResourceKind::Connections => "SASE connections",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation applied before any mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Site,
    Circuits,
    Location,
    BandwidthAvailable,
    Zone,
}

/// Declarative requirements of an action
#[derive(Debug, Clone, Copy)]
pub struct ActionPlan {
    /// A failed fetch aborts the run
    pub required: &'static [ResourceKind],
    /// A failed fetch is logged and treated as empty
    pub optional: &'static [ResourceKind],
    pub checks: &'static [Check],
}

impl ActionPlan {
    pub fn needs(&self, kind: ResourceKind) -> bool {
        self.required.contains(&kind) || self.optional.contains(&kind)
    }

    pub fn is_required(&self, kind: ResourceKind) -> bool {
        self.required.contains(&kind)
    }

    pub fn runs(&self, check: Check) -> bool {
        self.checks.contains(&check)
    }

    /// Kinds to fetch, in dependency order
    pub fn fetch_order(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        ResourceKind::LOAD_ORDER.into_iter().filter(|k| self.needs(*k))
    }

    /// Whether the action needs a target site
    pub fn needs_site(&self) -> bool {
        self.runs(Check::Site)
    }
}

/// Circuits requested for a connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CircuitSelection {
    /// Every active public circuit at the site
    #[default]
    All,
    Named(Vec<String>),
}

impl FromStr for CircuitSelection {
    type Err = SaseError;

    fn from_str(s: &str) -> Result<Self> {
        let names: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() {
            return Err(SaseError::MissingArgument("circuit_names"));
        }
        if names.iter().any(|n| n == ALL_CIRCUITS) {
            return Ok(CircuitSelection::All);
        }
        Ok(CircuitSelection::Named(names))
    }
}

/// Target names supplied by the operator
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub site: Option<String>,
    pub circuits: CircuitSelection,
    pub location: Option<String>,
    pub zone: Option<String>,
}

impl Request {
    /// Fail fast on parameters the action cannot run without
    pub fn require(&self, action: Action) -> Result<()> {
        let plan = action.plan();
        if plan.needs_site() && self.site.is_none() {
            return Err(SaseError::MissingArgument("sitename"));
        }
        if plan.runs(Check::Location) && self.location.is_none() {
            return Err(SaseError::MissingArgument("palocation"));
        }
        if plan.runs(Check::Zone) && self.zone.is_none() {
            return Err(SaseError::MissingArgument("zone"));
        }
        Ok(())
    }
}
