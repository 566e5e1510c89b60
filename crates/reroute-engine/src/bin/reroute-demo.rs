//! # Reroute Demo
//!
//! Solves one shipment against the configured network and prints the
//! impact report as JSON.
//!
//! ## Usage
//! ```bash
//! # 400 units to New York with route 2 closed
//! cargo run -p reroute-engine --bin reroute-demo -- --destination "New York" --quantity 400 --block 2
//!
//! # Price surge instead of a closure
//! cargo run -p reroute-engine --bin reroute-demo -- --destination Chicago --quantity 500 --surge 6 --multiplier 5
//!
//! # Guardian plan over two alternative closures
//! cargo run -p reroute-engine --bin reroute-demo -- --destination "New York" --quantity 400 --scenario 2 --scenario 7
//!
//! # Custom network file
//! cargo run -p reroute-engine --bin reroute-demo -- --config ./network.toml --destination Boston --quantity 50
//! ```

use std::env;
use std::path::PathBuf;

use reroute_core::{DisruptionEvent, RouteId, ShipmentRequirement};
use reroute_engine::{init_tracing, PlanningSession, RerouteConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut destination = String::from("New York");
    let mut quantity: u64 = 400;
    let mut blocked: Vec<RouteId> = Vec::new();
    let mut surged: Vec<RouteId> = Vec::new();
    let mut multiplier: f64 = 20.0;
    let mut scenarios: Vec<RouteId> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match (args[i].as_str(), value) {
            ("--config", Some(v)) => config_path = Some(PathBuf::from(v)),
            ("--destination", Some(v)) => destination = v,
            ("--quantity", Some(v)) => quantity = v.parse()?,
            ("--block", Some(v)) => blocked.push(RouteId(v.parse()?)),
            ("--surge", Some(v)) => surged.push(RouteId(v.parse()?)),
            ("--multiplier", Some(v)) => multiplier = v.parse()?,
            ("--scenario", Some(v)) => scenarios.push(RouteId(v.parse()?)),
            ("--help", _) | ("-h", _) => {
                print_usage();
                return Ok(());
            }
            (flag, _) => {
                eprintln!("Unknown or incomplete argument: {}", flag);
                print_usage();
                std::process::exit(2);
            }
        }
        i += 2;
    }

    let config = RerouteConfig::load(config_path)?;
    init_tracing(&config.logging);

    let session = PlanningSession::from_config(&config)?;
    let requirement = ShipmentRequirement::new(destination, quantity)?;

    if !session.summary().can_supply(quantity) {
        eprintln!(
            "Warning: {} units exceed total warehouse supply of {}",
            quantity,
            session.summary().total_supply
        );
    }

    if !scenarios.is_empty() {
        let scenario_events: Vec<Vec<DisruptionEvent>> = scenarios
            .into_iter()
            .map(|id| vec![DisruptionEvent::blocking([id], "Infrastructure Collapse")])
            .collect();
        let guardian = session.solve_guardian_plan(&requirement, &scenario_events)?;
        println!("{}", serde_json::to_string_pretty(&guardian)?);
        return Ok(());
    }

    let mut events = Vec::new();
    if !blocked.is_empty() {
        events.push(DisruptionEvent::blocking(blocked, "Infrastructure Collapse"));
    }
    if !surged.is_empty() {
        events.push(DisruptionEvent::new(surged, "Labor Strike", multiplier)?);
    }

    let report = session.assess(&requirement, &events)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    for change in report.route_changes() {
        eprintln!("{:?}", change);
    }
    eprintln!(
        "Cost delta: {} | unmet delta: {} | outcome: {}",
        report.cost_delta, report.unmet_delta, report.mitigated.outcome
    );

    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: reroute-demo [--config PATH] [--destination CITY] [--quantity N] \
         [--block ROUTE]... [--surge ROUTE]... [--multiplier X] [--scenario ROUTE]..."
    );
}
