//! # meshpairctl — operator console for the sensor network
//!
//! Composition root that wires a backend to an operator session and
//! drives it from a line-oriented console.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Initialise tracing
//! - Construct the configured [`DataSource`] adapter
//! - Construct the [`Session`], load the initial snapshots, and translate
//!   console commands into session operations
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use meshpair_adapter_remote::RemoteDataSource;
use meshpair_adapter_simulated::SimulatedDataSource;
use meshpair_app::ports::DataSource;
use meshpair_app::session::{PairOutcome, Refusal, ScanOutcome, Session};
use meshpair_domain::id::Mac;
use meshpair_domain::node::NodeKind;
use meshpair_domain::relay::RelayTarget;

use config::{Config, Mode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    match config.source.mode {
        Mode::Simulated => {
            tracing::info!("starting with simulated backend");
            run(Session::new(SimulatedDataSource::default())).await?;
        }
        Mode::Remote => {
            tracing::info!(base_url = %config.source.base_url, "starting with remote backend");
            let source = RemoteDataSource::new(&config.source.base_url)?;
            run(Session::new(source)).await?;
        }
    }
    Ok(())
}

/// Read console commands and apply them to the session until EOF or `quit`.
async fn run<D: DataSource>(session: Session<D>) -> std::io::Result<()> {
    let mut out = tokio::io::stdout();
    out.write_all(b"meshpair operator console - 'help' lists commands\n")
        .await?;

    session.refresh_all().await;
    print_status(&mut out, &session).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        out.write_all(b"> ").await?;
        out.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("help"), _) => {
                out.write_all(HELP.as_bytes()).await?;
            }
            (Some("list"), _) => print_network(&mut out, &session).await?,
            (Some("scan"), _) => {
                match session.scan().await {
                    ScanOutcome::Completed { new_nodes } => {
                        writeln(&mut out, format!("scan finished, {new_nodes} new node(s)"))
                            .await?;
                    }
                    ScanOutcome::Failed => writeln(&mut out, "scan failed".to_string()).await?,
                    ScanOutcome::InFlight => {
                        writeln(&mut out, "a scan is already running".to_string()).await?;
                    }
                }
                print_status(&mut out, &session).await?;
            }
            (Some("select"), Some(arg)) => match arg.parse::<Mac>() {
                Ok(mac) if session.select(&mac) => {
                    writeln(&mut out, format!("selected {mac}")).await?;
                }
                Ok(mac) => writeln(&mut out, format!("{mac} is not available")).await?,
                Err(err) => writeln(&mut out, format!("bad MAC: {err}")).await?,
            },
            (Some("dest"), Some(arg)) => match arg.parse::<RelayTarget>() {
                Ok(relay) => {
                    session.set_destination(relay);
                    writeln(&mut out, format!("destination set to {}", session.destination()))
                        .await?;
                }
                Err(err) => writeln(&mut out, format!("bad destination: {err}")).await?,
            },
            (Some("pair"), _) => {
                match session.pair().await {
                    PairOutcome::Paired => writeln(&mut out, "paired".to_string()).await?,
                    PairOutcome::Refused(Refusal::NoCandidate) => {
                        writeln(&mut out, "select a node first".to_string()).await?;
                    }
                    PairOutcome::Refused(Refusal::InvalidDestination) => {
                        writeln(&mut out, "destination not allowed for this node".to_string())
                            .await?;
                    }
                    PairOutcome::Failed => writeln(&mut out, "pairing failed".to_string()).await?,
                    PairOutcome::InFlight => {
                        writeln(&mut out, "a pairing is already running".to_string()).await?;
                    }
                }
                print_status(&mut out, &session).await?;
            }
            (Some("cancel"), _) => {
                session.cancel_selection();
                writeln(&mut out, "selection cleared".to_string()).await?;
            }
            (Some("status"), _) => print_status(&mut out, &session).await?,
            (Some("quit" | "exit"), _) => break,
            (Some(other), _) => {
                writeln(&mut out, format!("unknown command '{other}', try 'help'")).await?;
            }
            (None, _) => {}
        }
    }
    Ok(())
}

const HELP: &str = "\
commands:
  list             show all three node partitions
  scan             discover unpaired nodes
  select <mac>     choose an available node for pairing
  dest <hub|mac>   choose the relay destination (default: hub)
  pair             pair the selected node to the destination
  cancel           drop the current selection
  status           show the transient status line
  quit             leave the console
";

async fn writeln(out: &mut tokio::io::Stdout, line: String) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}

async fn print_status<D: DataSource>(
    out: &mut tokio::io::Stdout,
    session: &Session<D>,
) -> std::io::Result<()> {
    if let Some(message) = session.status_message() {
        writeln(out, format!("[{message}]")).await?;
    }
    Ok(())
}

async fn print_network<D: DataSource>(
    out: &mut tokio::io::Stdout,
    session: &Session<D>,
) -> std::io::Result<()> {
    let available = session.available();
    writeln(out, format!("available ({}):", available.len())).await?;
    for node in available {
        let kind = match node.kind {
            NodeKind::Sensor => "sensor",
            NodeKind::Coordinator => "coordinator",
        };
        writeln(out, format!("  {} [{kind}]", node.mac)).await?;
    }

    let coordinators = session.coordinators();
    writeln(out, format!("coordinators ({}):", coordinators.len())).await?;
    for node in coordinators {
        writeln(out, format!("  {} -> hub", node.mac)).await?;
    }

    let sensors = session.sensors();
    writeln(out, format!("sensors ({}):", sensors.len())).await?;
    for node in sensors {
        writeln(
            out,
            format!(
                "  {} -> {}  {}°C {}%",
                node.mac, node.relay, node.reading.temperature, node.reading.humidity
            ),
        )
        .await?;
    }

    if let Some(selected) = session.selected() {
        writeln(
            out,
            format!("selected: {} -> {}", selected.mac, session.destination()),
        )
        .await?;
    }
    Ok(())
}
