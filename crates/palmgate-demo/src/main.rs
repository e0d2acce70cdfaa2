//! Scripted driver for the PalmGate access-flow simulation.
//!
//! Runs the reference scenarios against the orchestrator and prints the
//! event log and attendance summary at the end. This binary stands in for
//! the original visual front end; the panels it would render are exactly
//! the status fields of each published snapshot.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use palmgate_core::{ScanOutcome, UserName, UserRole};
use palmgate_flow::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let flow = Orchestrator::new();

    // Reference scenarios: security agent, teacher opening the class, an
    // enrolled student, and a student who is not on the roster.
    scan(&flow, UserRole::Security, "RACHID").await?;
    scan(&flow, UserRole::Teacher, "AHMED").await?;
    scan(&flow, UserRole::Student, "MOHAMMED").await?;
    scan(&flow, UserRole::Student, "ZAID").await?;

    print_report(&flow);
    Ok(())
}

async fn scan(flow: &Orchestrator, role: UserRole, who: &str) -> Result<()> {
    let name: UserName = who.parse()?;
    info!(%role, user = %name, "--- triggering scan ---");

    let outcome = flow.trigger_scan(role, name).await?;
    match outcome {
        ScanOutcome::Granted => info!(user = who, "access granted"),
        ScanOutcome::Denied(reason) => info!(user = who, %reason, "access denied"),
    }

    // Let the door auto-close and the panels settle before the next scan.
    flow.wait_for_idle().await;
    Ok(())
}

fn print_report(flow: &Orchestrator) {
    let state = flow.snapshot();

    println!("\n=== Event Log ===");
    for entry in state.event_log.entries() {
        println!(
            "[{}] {:>10}  {}",
            entry.time_display(),
            entry.category.to_string(),
            entry.message
        );
    }

    if let Some(session) = &state.current_session {
        println!(
            "\n=== Session: {} ({}) - teacher {} ===",
            session.course(),
            session.room(),
            session.teacher()
        );
        for record in session.attendance() {
            println!(
                "[{}] {} - Present",
                record.timestamp.format("%H:%M:%S"),
                record.student
            );
        }
    }
}
