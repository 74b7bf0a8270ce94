//! Connection driver
//!
//! Applies an action's state transition against the remote API:
//!
//! ```text
//!   Unconfigured ──create──▶ Configured ──clear──▶ Cleared
//!                               ▲                     │
//!                               └───────create────────┘
//! ```
//!
//! Connections are never deleted. Clearing empties the tunnel lists and the
//! enabled circuits and leaves the connection and its groups in place.

use serde::Serialize;
use tracing::{info, warn};

use crate::api::SaseApi;
use crate::error::Warning;
use crate::index::ResourceIndex;
use crate::model::{SaseConnection, SecurityZone, Site, ZoneBinding};
use crate::planner::ConnectionPlan;
use crate::{Result, SaseError};

/// Connection state of a site, derived from its connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Unconfigured,
    Configured,
    Cleared,
}

impl ConnectionState {
    pub fn of(connections: &[SaseConnection]) -> Self {
        if connections.is_empty() {
            ConnectionState::Unconfigured
        } else if connections.iter().any(SaseConnection::has_bindings) {
            ConnectionState::Configured
        } else {
            ConnectionState::Cleared
        }
    }
}

/// Result of creating a connection
#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub site: String,
    pub connection_id: String,
    pub location: String,
    pub spn_name: String,
    pub allocated_bandwidth_mbps: f64,
    pub group_name: String,
    pub tunnels: Vec<String>,
    pub previous_state: ConnectionState,
    pub warnings: Vec<Warning>,
}

/// Result of clearing a site's connections
#[derive(Debug, Clone, Serialize)]
pub struct ClearReport {
    pub site: String,
    pub cleared: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Zone bound on one element
#[derive(Debug, Clone, Serialize)]
pub struct ElementBinding {
    pub element: String,
    pub interfaces: Vec<String>,
}

/// Result of binding a zone across a site
#[derive(Debug, Clone, Serialize)]
pub struct BindReport {
    pub site: String,
    pub zone: String,
    pub bound: Vec<ElementBinding>,
    /// Circuits at the site, when known
    pub circuits: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// One row of the edge location listing
#[derive(Debug, Clone, Serialize)]
pub struct LocationSummary {
    pub region: String,
    pub display_name: String,
    pub value: String,
    pub allocated_bandwidth_mbps: f64,
}

/// Funded locations grouped by region, in allocation order
pub fn list_locations(index: &ResourceIndex) -> Vec<LocationSummary> {
    let mut rows = Vec::new();
    for region in index.allocation_regions() {
        let Some(allocation) = index.allocation_for_region(region) else {
            continue;
        };
        if !allocation.is_funded() {
            continue;
        }
        for location in index.locations_in_region(region) {
            rows.push(LocationSummary {
                region: region.clone(),
                display_name: location.display_name.clone(),
                value: location.value.clone(),
                allocated_bandwidth_mbps: allocation.allocated_bandwidth_mbps,
            });
        }
    }
    rows
}

/// Executes connection transitions for one site
pub struct ConnectionDriver<'a, A: SaseApi + ?Sized> {
    api: &'a A,
    index: &'a ResourceIndex,
}

impl<'a, A: SaseApi + ?Sized> ConnectionDriver<'a, A> {
    pub fn new(api: &'a A, index: &'a ResourceIndex) -> Self {
        Self { api, index }
    }

    /// Send a planned connection. The remote side does not merge: a site
    /// that is already configured gains a second remote network group.
    pub async fn create(&self, plan: &ConnectionPlan) -> Result<CreateReport> {
        let existing = self.index.connections_at(&plan.site_id);
        let previous_state = ConnectionState::of(existing);
        let mut warnings = Vec::new();

        if previous_state == ConnectionState::Configured {
            let warning = Warning::ConnectionAlreadyConfigured {
                site: plan.site_name.clone(),
                connections: existing.len(),
            };
            warn!("{}", warning);
            warnings.push(warning);
        }

        let connection = self
            .api
            .create_connection(&plan.site_id, &plan.payload)
            .await
            .map_err(|e| SaseError::RemoteMutationFailed {
                operation: format!("establish SASE connection at site {}", plan.site_name),
                source: e,
            })?;
        info!(
            "SASE connection {} requested at site {} ({} tunnels)",
            connection.id,
            plan.site_name,
            plan.tunnel_names.len()
        );

        Ok(CreateReport {
            site: plan.site_name.clone(),
            connection_id: connection.id,
            location: plan.location.clone(),
            spn_name: plan.spn_name.clone(),
            allocated_bandwidth_mbps: plan.allocated_bandwidth_mbps,
            group_name: plan.group_name.clone(),
            tunnels: plan.tunnel_names.clone(),
            previous_state,
            warnings,
        })
    }

    /// Unbind every circuit from every connection at the site, one update
    /// per connection. Updates already sent are not reverted on failure.
    pub async fn clear(&self, site: &Site) -> Result<ClearReport> {
        let connections = self.index.connections_at(&site.id);
        let mut report = ClearReport {
            site: site.name.clone(),
            cleared: Vec::new(),
            warnings: Vec::new(),
        };

        if connections.is_empty() {
            let warning = Warning::NoConnectionsFound {
                site: site.name.clone(),
            };
            warn!("{}", warning);
            report.warnings.push(warning);
            return Ok(report);
        }

        for connection in connections {
            let cleared = connection.cleared();
            self.api
                .update_connection(&site.id, &connection.id, &cleared)
                .await
                .map_err(|e| SaseError::RemoteMutationFailed {
                    operation: format!("edit SASE connection {}", connection.id),
                    source: e,
                })?;
            info!("Circuits unbound from SASE connection {}", connection.id);
            report.cleared.push(connection.id.clone());
        }

        Ok(report)
    }

    /// Bind `zone` to the managed service links of every element at the
    /// site. Elements without service links, or whose bind call fails, are
    /// reported and skipped. Fails only when no element could be bound.
    pub async fn bind_zone(&self, site: &Site, zone: &SecurityZone) -> Result<BindReport> {
        let mut report = BindReport {
            site: site.name.clone(),
            zone: zone.name.clone(),
            bound: Vec::new(),
            circuits: self
                .index
                .circuits_at(&site.id)
                .map(|c| c.active.names())
                .unwrap_or_default(),
            warnings: Vec::new(),
        };
        let mut first_failure = None;

        for element in self.index.elements_at(&site.id) {
            let links = self.index.service_links(&element.id);
            if links.is_empty() {
                let warning = Warning::NoServiceLinksOnElement {
                    site: site.name.clone(),
                    element: element.name.clone(),
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }

            let binding = ZoneBinding::interfaces(
                zone.id.clone(),
                links.iter().map(|l| l.id.clone()).collect(),
            );
            if let Err(e) = self.api.bind_zone(&site.id, &element.id, &binding).await {
                let warning = Warning::BindFailed {
                    site: site.name.clone(),
                    element: element.name.clone(),
                    reason: e.to_string(),
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                first_failure.get_or_insert(SaseError::RemoteMutationFailed {
                    operation: format!(
                        "bind zone {} to {}:{}",
                        zone.name, site.name, element.name
                    ),
                    source: e,
                });
                continue;
            }
            info!("Zone {} bound to {}:{}", zone.name, site.name, element.name);

            report.bound.push(ElementBinding {
                element: element.name.clone(),
                interfaces: links.iter().map(|l| l.name.clone()).collect(),
            });
        }

        // nothing bound and at least one call failed
        match first_failure {
            Some(err) if report.bound.is_empty() => Err(err),
            _ => Ok(report),
        }
    }
}
