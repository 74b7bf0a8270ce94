//! saseconn - SASE connection orchestration
//!
//! Connects a branch site's circuits to a cloud security edge location
//! through the SASE management API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          saseconn                                │
//! │                                                                  │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │   Topology   │──▶│   Resource   │◀──│      Validator       │  │
//! │  │    Loader    │   │    Index     │   └──────────┬───────────┘  │
//! │  └──────▲───────┘   └──────┬───────┘              │              │
//! │         │                  │           ┌──────────▼───────────┐  │
//! │         │                  └──────────▶│ Connection Planner   │  │
//! │         │                              └──────────┬───────────┘  │
//! │  ┌──────┴──────────────────────────┐   ┌──────────▼───────────┐  │
//! │  │          SaseApi (HTTP)         │◀──│  Connection Driver   │  │
//! │  └─────────────────────────────────┘   └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each invocation fetches one snapshot, validates the request against it
//! and only then issues mutating calls, one at a time.

pub mod action;
pub mod api;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod output;
pub mod planner;
pub mod validate;

pub use action::{Action, CircuitSelection, Request, ResourceKind};
pub use api::{ApiError, HttpSaseApi, SaseApi};
pub use config::Config;
pub use driver::{ConnectionDriver, ConnectionState};
pub use engine::{run, Outcome, RunOptions};
pub use error::{Result, SaseError, Warning};
pub use index::ResourceIndex;
pub use loader::TopologyLoader;
pub use planner::{ConnectionPlan, ConnectionPlanner};
