//! Error and warning types

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::action::ResourceKind;
use crate::api::ApiError;

/// Result type alias for saseconn operations
pub type Result<T> = std::result::Result<T, SaseError>;

/// Fatal errors. Every one of them ends the invocation.
#[derive(Debug, Error)]
pub enum SaseError {
    #[error("{0} not provided")]
    MissingArgument(&'static str),

    #[error("Invalid site name: {site}. No spoke site with this name")]
    UnknownSite { site: String, valid: Vec<String> },

    #[error("Invalid circuit name: {circuit}. No such circuit configured at site {site}")]
    CircuitUnknown {
        circuit: String,
        site: String,
        valid: Vec<String>,
    },

    #[error("Circuit {circuit} not bound to any interface at site {site}")]
    CircuitInactive {
        circuit: String,
        site: String,
        valid: Vec<String>,
    },

    #[error("No active public circuits at site {site}")]
    NoEligibleCircuits { site: String, inactive: Vec<String> },

    #[error("Invalid edge location: {location}")]
    UnknownLocation { location: String, valid: Vec<String> },

    #[error("No bandwidth allocated to edge location: {location}")]
    LocationUnfunded { location: String, valid: Vec<String> },

    #[error("Bandwidth not allocated to any edge location. Allocate bandwidth to a remote network region first")]
    NoBandwidthAllocated,

    #[error("Invalid zone: {zone}")]
    UnknownZone { zone: String, valid: Vec<String> },

    #[error("No default QoS profile found for remote networks")]
    NoDefaultQosProfile,

    #[error("Could not retrieve {resource}: {source}")]
    RemoteFetchFailed {
        resource: ResourceKind,
        #[source]
        source: ApiError,
    },

    #[error("Could not {operation}: {source}")]
    RemoteMutationFailed {
        operation: String,
        #[source]
        source: ApiError,
    },

    #[error("Authentication failed: {0}")]
    Auth(#[source] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SaseError {
    /// Valid choices the operator can pick from instead
    pub fn alternatives(&self) -> Option<&[String]> {
        match self {
            SaseError::UnknownSite { valid, .. }
            | SaseError::CircuitUnknown { valid, .. }
            | SaseError::CircuitInactive { valid, .. }
            | SaseError::UnknownLocation { valid, .. }
            | SaseError::LocationUnfunded { valid, .. }
            | SaseError::UnknownZone { valid, .. } => Some(valid.as_slice()),
            _ => None,
        }
    }

    /// Circuits that exist but no interface uses. Not selectable until rebound.
    pub fn unbound_circuits(&self) -> Option<&[String]> {
        match self {
            SaseError::NoEligibleCircuits { inactive, .. } if !inactive.is_empty() => {
                Some(inactive.as_slice())
            }
            _ => None,
        }
    }

    /// Raised before any remote mutation is attempted
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            SaseError::RemoteFetchFailed { .. }
                | SaseError::RemoteMutationFailed { .. }
                | SaseError::Auth(_)
                | SaseError::Config(_)
        )
    }
}

/// Non-fatal conditions reported alongside an outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    NoConnectionsFound { site: String },
    NoServiceLinksOnElement { site: String, element: String },
    ConnectionAlreadyConfigured { site: String, connections: usize },
    DuplicateCircuit { circuit: String },
    BindFailed {
        site: String,
        element: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoConnectionsFound { site } => {
                write!(f, "No SASE connections found at site {}", site)
            }
            Warning::NoServiceLinksOnElement { site, element } => {
                write!(f, "No SASE tunnels found on {}:{}", site, element)
            }
            Warning::ConnectionAlreadyConfigured { site, connections } => write!(
                f,
                "Site {} already has {} configured SASE connection(s). A new remote network group will be added alongside",
                site, connections
            ),
            Warning::DuplicateCircuit { circuit } => {
                write!(f, "Circuit {} requested more than once", circuit)
            }
            Warning::BindFailed {
                site,
                element,
                reason,
            } => write!(f, "Could not bind zone on {}:{}: {}", site, element, reason),
        }
    }
}
