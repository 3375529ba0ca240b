//! Leel dashboard operator console
//!
//! Runs the synchronization engine headless against the configured backend,
//! logs one status line per state change and takes commands on stdin.

use anyhow::{Context, Result};
use leel_dashboard::{Dashboard, DashboardConfig, DashboardState, DetailState, HttpTransport, JobDraft, StateStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "commands: refresh | jobs | show <jobId> | close | create <schedule> <api> [type] | quit";

#[derive(Debug, PartialEq)]
enum Command {
    Refresh,
    Jobs,
    Show(String),
    Close,
    Create(JobDraft),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = match (words.next()?, words.next(), words.next(), words.next()) {
        ("refresh", None, ..) => Command::Refresh,
        ("jobs", None, ..) => Command::Jobs,
        ("show", Some(job_id), None, _) => Command::Show(job_id.to_string()),
        ("close", None, ..) => Command::Close,
        ("create", Some(schedule), Some(api), job_type) => {
            let draft = JobDraft::new(schedule, api);
            Command::Create(match job_type {
                Some(job_type) => draft.with_type(job_type),
                None => draft,
            })
        }
        ("quit" | "exit", None, ..) => Command::Quit,
        _ => return None,
    };
    // trailing words after a complete command
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

fn status_line(state: &DashboardState) -> String {
    let connectivity = if state.loading {
        "loading"
    } else if state.is_online() {
        "online"
    } else {
        "offline"
    };
    let mut line = format!(
        "backend {connectivity}: {} jobs, {} executions ({} running/pending)",
        state.jobs.len(),
        state.executions.len(),
        state.current_executions().len()
    );
    match &state.detail {
        Some(DetailState::Loading { job_id }) => line.push_str(&format!(", loading {job_id}")),
        Some(DetailState::Ready(view)) => line.push_str(&format!(
            ", {} selected ({} recent executions)",
            view.job.short_id(),
            view.recent_executions.len()
        )),
        Some(DetailState::Failed { job_id, message }) => {
            line.push_str(&format!(", {job_id}: {message}"))
        }
        None => {}
    }
    line
}

fn print_jobs(state: &DashboardState) {
    if state.jobs.is_empty() {
        println!("no jobs");
        return;
    }
    for job in &state.jobs {
        let rate = job
            .stats
            .as_ref()
            .and_then(|stats| stats.success_rate())
            .map(|rate| format!("{:.0}%", rate * 100.0))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {:<16} {:<6} {:<5} {}",
            job.short_id(),
            job.schedule,
            job.job_type.as_deref().unwrap_or("-"),
            rate,
            job.api
        );
    }
}

/// Logs a status line whenever the store changes, until it is deactivated.
fn spawn_status_logger(store: StateStore) {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            if !store.is_active() {
                break;
            }
            info!("{}", store.read(status_line));
        }
    });
}

async fn handle(dashboard: &Dashboard<HttpTransport>, command: Command) -> bool {
    match command {
        Command::Refresh => {
            if let Some(cycle) = dashboard.refresh() {
                match cycle.await {
                    Ok(outcome) => info!(?outcome, "manual refresh done"),
                    Err(e) => warn!(error = %e, "manual refresh task failed"),
                }
            }
        }
        Command::Jobs => dashboard.store().read(print_jobs),
        Command::Show(job_id) => {
            if dashboard.select_job(&job_id).is_none() {
                warn!("cannot select job {job_id}");
            }
        }
        Command::Close => dashboard.close_detail(),
        Command::Create(draft) => match dashboard.create_job(&draft).await {
            Ok(reply) => info!(%reply, "job created"),
            Err(e) => warn!(error = %e, "job creation failed"),
        },
        Command::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leel_dashboard=info")),
        )
        .init();

    let config = DashboardConfig::load().await;
    let dashboard = Dashboard::connect(&config).context("failed to start dashboard")?;
    spawn_status_logger(dashboard.store().clone());
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(command) => {
                        if !handle(&dashboard, command).await {
                            break;
                        }
                    }
                    None => println!("{HELP}"),
                }
            }
        }
    }

    dashboard.deactivate().await;
    Ok(())
}
