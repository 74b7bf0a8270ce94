//! Request validation against the resource index
//!
//! Every rejection carries the full list of valid choices so the operator
//! can correct the request without another lookup.

use tracing::warn;

use crate::action::{Action, Check, CircuitSelection, Request};
use crate::error::Warning;
use crate::index::ResourceIndex;
use crate::model::{Location, SecurityZone, Site};
use crate::{Result, SaseError};

/// References resolved from a request
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub site: Option<Site>,
    /// Circuit ids in request order
    pub circuit_ids: Vec<String>,
    pub location: Option<Location>,
    pub zone: Option<SecurityZone>,
    pub warnings: Vec<Warning>,
}

/// Run every check the action declares
pub fn validate(action: Action, index: &ResourceIndex, request: &Request) -> Result<Validated> {
    request.require(action)?;
    let plan = action.plan();
    let mut validated = Validated::default();

    if plan.runs(Check::BandwidthAvailable) && index.funded_locations().is_empty() {
        return Err(SaseError::NoBandwidthAllocated);
    }

    if plan.runs(Check::Site) {
        let name = request.site.as_deref().unwrap_or_default();
        validated.site = Some(resolve_site(index, name)?.clone());
    }

    if plan.runs(Check::Circuits) {
        if let Some(site) = &validated.site {
            let (ids, warnings) = resolve_circuits(index, site, &request.circuits)?;
            validated.circuit_ids = ids;
            validated.warnings.extend(warnings);
        }
    }

    if plan.runs(Check::Location) {
        let name = request.location.as_deref().unwrap_or_default();
        validated.location = Some(resolve_location(index, name)?.clone());
    }

    if plan.runs(Check::Zone) {
        let name = request.zone.as_deref().unwrap_or_default();
        validated.zone = Some(resolve_zone(index, name)?.clone());
    }

    Ok(validated)
}

/// Resolve a spoke site by name
pub fn resolve_site<'a>(index: &'a ResourceIndex, name: &str) -> Result<&'a Site> {
    index
        .sites
        .by_name(name)
        .filter(|s| s.is_spoke())
        .ok_or_else(|| SaseError::UnknownSite {
            site: name.to_string(),
            valid: index.spoke_site_names(),
        })
}

/// Resolve requested circuits to ids of active public circuits
pub fn resolve_circuits(
    index: &ResourceIndex,
    site: &Site,
    selection: &CircuitSelection,
) -> Result<(Vec<String>, Vec<Warning>)> {
    let circuits = index.circuits_at(&site.id).cloned().unwrap_or_default();
    let eligible_names = circuits.eligible_names();

    let names = match selection {
        CircuitSelection::All => {
            if circuits.eligible.is_empty() {
                return Err(SaseError::NoEligibleCircuits {
                    site: site.name.clone(),
                    inactive: circuits.inactive_names(),
                });
            }
            return Ok((circuits.eligible.clone(), Vec::new()));
        }
        CircuitSelection::Named(names) => names,
    };

    let mut ids = Vec::with_capacity(names.len());
    let mut warnings = Vec::new();
    for name in names {
        let circuit = circuits
            .active
            .by_name(name)
            .filter(|c| c.is_eligible());

        let circuit = match circuit {
            Some(c) => c,
            None if circuits.is_inactive(name) => {
                return Err(SaseError::CircuitInactive {
                    circuit: name.clone(),
                    site: site.name.clone(),
                    valid: eligible_names,
                });
            }
            None => {
                return Err(SaseError::CircuitUnknown {
                    circuit: name.clone(),
                    site: site.name.clone(),
                    valid: eligible_names,
                });
            }
        };

        if ids.contains(&circuit.id) {
            warn!("Circuit {} requested more than once", name);
            warnings.push(Warning::DuplicateCircuit {
                circuit: name.clone(),
            });
            continue;
        }
        ids.push(circuit.id.clone());
    }

    Ok((ids, warnings))
}

/// Resolve a funded edge location by display name, or by value
pub fn resolve_location<'a>(index: &'a ResourceIndex, name: &str) -> Result<&'a Location> {
    let funded = || {
        index
            .funded_locations()
            .iter()
            .map(|l| l.display_name.clone())
            .collect::<Vec<_>>()
    };

    let location = index
        .locations
        .by_name(name)
        .or_else(|| index.locations.by_id(name))
        .ok_or_else(|| SaseError::UnknownLocation {
            location: name.to_string(),
            valid: funded(),
        })?;

    if !index.is_funded(location) {
        return Err(SaseError::LocationUnfunded {
            location: name.to_string(),
            valid: funded(),
        });
    }
    Ok(location)
}

/// Resolve a security zone by name
pub fn resolve_zone<'a>(index: &'a ResourceIndex, name: &str) -> Result<&'a SecurityZone> {
    index
        .security_zones
        .by_name(name)
        .ok_or_else(|| SaseError::UnknownZone {
            zone: name.to_string(),
            valid: index.security_zones.names(),
        })
}
