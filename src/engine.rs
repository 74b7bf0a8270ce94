//! One invocation end to end: load, validate, plan, drive.

use serde::Serialize;
use tracing::info;

use crate::action::{Action, Request};
use crate::api::SaseApi;
use crate::driver::{
    list_locations, BindReport, ClearReport, ConnectionDriver, CreateReport, LocationSummary,
};
use crate::loader::TopologyLoader;
use crate::planner::{ConnectionPlan, ConnectionPlanner};
use crate::validate::{validate, Validated};
use crate::{Result, SaseError};

/// Run options outside the request itself
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Plan a connection without creating it
    pub dry_run: bool,
}

/// What an invocation did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Locations { locations: Vec<LocationSummary> },
    Planned { plan: ConnectionPlan },
    Created { report: CreateReport },
    Cleared { report: ClearReport },
    Bound { report: BindReport },
}

/// Execute `action` for `request`. Every validation runs before the first
/// mutating call.
pub async fn run<A: SaseApi + ?Sized>(
    api: &A,
    action: Action,
    request: &Request,
    options: RunOptions,
) -> Result<Outcome> {
    request.require(action)?;

    let index = TopologyLoader::new(api)
        .load(action, request.site.as_deref())
        .await?;
    let validated = validate(action, &index, request)?;
    let driver = ConnectionDriver::new(api, &index);

    match action {
        Action::ListLocations => Ok(Outcome::Locations {
            locations: list_locations(&index),
        }),
        Action::ConfigConnection => {
            let site = target_site(&validated)?;
            let location = validated
                .location
                .as_ref()
                .ok_or(SaseError::MissingArgument("palocation"))?;
            let plan = ConnectionPlanner::new(&index).plan(site, &validated.circuit_ids, location)?;

            if options.dry_run {
                info!("Dry run, connection for {} not sent", plan.site_name);
                return Ok(Outcome::Planned { plan });
            }

            let mut report = driver.create(&plan).await?;
            let mut warnings = validated.warnings.clone();
            warnings.append(&mut report.warnings);
            report.warnings = warnings;
            Ok(Outcome::Created { report })
        }
        Action::DeleteConnection => {
            let report = driver.clear(target_site(&validated)?).await?;
            Ok(Outcome::Cleared { report })
        }
        Action::BindZone => {
            let zone = validated
                .zone
                .as_ref()
                .ok_or(SaseError::MissingArgument("zone"))?;
            let report = driver.bind_zone(target_site(&validated)?, zone).await?;
            Ok(Outcome::Bound { report })
        }
    }
}

fn target_site(validated: &Validated) -> Result<&crate::model::Site> {
    validated
        .site
        .as_ref()
        .ok_or(SaseError::MissingArgument("sitename"))
}
