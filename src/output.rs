//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::driver::{BindReport, ClearReport, CreateReport, LocationSummary};
use crate::engine::Outcome;
use crate::error::Warning;
use crate::planner::ConnectionPlan;
use crate::SaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, data: &T) -> String {
        match self {
            OutputFormat::Yaml => serde_yaml::to_string(data).unwrap_or_default(),
            OutputFormat::Json | OutputFormat::Table => {
                serde_json::to_string_pretty(data).unwrap_or_default()
            }
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.render(data));
    }

    /// Print what an invocation did
    pub fn print_outcome(&self, outcome: &Outcome) {
        if *self != OutputFormat::Table {
            self.print(outcome);
            return;
        }

        match outcome {
            Outcome::Locations { locations } => print_locations(locations),
            Outcome::Planned { plan } => {
                print_plan(plan);
                self.print(&plan.payload);
            }
            Outcome::Created { report } => print_created(report),
            Outcome::Cleared { report } => print_cleared(report),
            Outcome::Bound { report } => print_bound(report),
        }
    }
}

#[derive(Tabled)]
struct LocationRow<'a> {
    #[tabled(rename = "Region")]
    region: &'a str,
    #[tabled(rename = "Location")]
    display_name: &'a str,
    #[tabled(rename = "Value")]
    value: &'a str,
    #[tabled(rename = "Bandwidth (Mbps)")]
    bandwidth: f64,
}

pub fn locations_table(locations: &[LocationSummary]) -> String {
    let rows = locations.iter().map(|l| LocationRow {
        region: &l.region,
        display_name: &l.display_name,
        value: &l.value,
        bandwidth: l.allocated_bandwidth_mbps,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_locations(locations: &[LocationSummary]) {
    info("Edge locations with allocated bandwidth:");
    println!("{}", locations_table(locations));
}

fn print_plan(plan: &ConnectionPlan) {
    info(&format!(
        "Dry run. SASE connection for site {} not sent.",
        plan.site_name
    ));
    println!("\tRemote network group: {}", plan.group_name);
    for tunnel in &plan.tunnel_names {
        println!("\tTunnel: {}", tunnel);
    }
}

fn print_created(report: &CreateReport) {
    print_warnings(&report.warnings);
    info("SASE connection request sent. Connection details:");
    println!("\tSite Name: {}", report.site);
    println!(
        "\tEdge Location: {} [{}]. Allocated BW: {} Mbps",
        report.location, report.spn_name, report.allocated_bandwidth_mbps
    );
    println!("\tRemote network group: {}", report.group_name);
    for tunnel in &report.tunnels {
        println!("\tTunnel: {}", tunnel);
    }
}

fn print_cleared(report: &ClearReport) {
    print_warnings(&report.warnings);
    for id in &report.cleared {
        info(&format!(
            "Circuits unbound from SASE connection {}. Cleanup request sent.",
            id
        ));
    }
}

fn print_bound(report: &BindReport) {
    print_warnings(&report.warnings);
    for binding in &report.bound {
        info(&format!(
            "Zone {} bound to {}:{} on:",
            report.zone, report.site, binding.element
        ));
        for name in &binding.interfaces {
            println!("\t{}", name);
        }
    }
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("{} {}", "WARN:".yellow().bold(), warning);
    }
}

fn info(message: &str) {
    println!("{} {}", "INFO:".green().bold(), message);
}

/// Print a fatal error and the choices that would have been valid
pub fn print_error(err: &SaseError) {
    eprintln!("{} {}", "ERR:".red().bold(), err);
    eprint!("{}", error_details(err));
    eprintln!("Exiting..");
}

/// Lines printed under a fatal error
pub fn error_details(err: &SaseError) -> String {
    let mut out = String::new();
    if let Some(valid) = err.alternatives() {
        if valid.is_empty() {
            out.push_str("No valid choices available.\n");
        } else {
            out.push_str("Please select from the following:\n");
            for choice in valid {
                out.push_str(&format!("\t{}\n", choice));
            }
        }
    }
    if let Some(unbound) = err.unbound_circuits() {
        out.push_str("Circuits not bound to any interface:\n");
        for name in unbound {
            out.push_str(&format!("\t{}\n", name));
        }
    }
    out
}
