use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{dispatch, execute, ChartDeskClient, ClientHandle, ControllerCommand};
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    sync::oneshot,
    task::JoinHandle,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Overrides};

const HELP: &str = "commands:
  select <path>      pick the data file to work with
  upload             upload the selected file
  chart [type]       generate a chart (bar, pie, line; default bar)
  clear              clear server files and shown charts
  report             build a report from the generated charts and download it
  quit               leave";

#[derive(Parser, Debug)]
#[command(name = "chartdesk", about = "Upload data files, generate charts and download reports")]
struct Args {
    /// Base URL of the chart service.
    #[arg(long)]
    server_url: Option<String>,
    /// Config file; defaults to ./chartdesk.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Data file to select on startup.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Where downloaded reports are written.
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Run these commands in order and exit instead of reading stdin.
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let overrides = Overrides {
        server_url: args.server_url.clone(),
        download_dir: args.download_dir.clone(),
    };
    let settings = load_settings(args.config.as_deref(), &overrides)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = ChartDeskClient::new(settings.server_url.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let renderer = tokio::spawn(render::run(
        client.clone(),
        client.subscribe_events(),
        settings.download_dir.clone(),
        shutdown_rx,
    ));

    if let Some(path) = args.file {
        execute(&*client, ControllerCommand::Select(path))
            .await
            .context("failed to select startup file")?;
    }

    let scripted = !args.commands.is_empty();
    let mut failures = if scripted {
        run_script(&client, &args.commands).await?
    } else {
        run_interactive(client.clone()).await?;
        0
    };

    let _ = shutdown_tx.send(());
    let failed_downloads = renderer.await.unwrap_or(0);
    if scripted {
        failures += failed_downloads;
    }

    if failures > 0 {
        return Err(anyhow!("{failures} command(s) or report download(s) failed"));
    }
    Ok(())
}

async fn run_script(client: &ChartDeskClient, lines: &[String]) -> Result<usize> {
    let mut failures = 0;
    for line in lines {
        let cmd: ControllerCommand = line
            .parse()
            .with_context(|| format!("invalid command '{line}'"))?;
        let cmd_name = cmd.name();
        if let Err(err) = execute(client, cmd).await {
            if !err.is_validation() {
                debug!(command = cmd_name, error = %err, "command failed");
            }
            failures += 1;
        }
    }
    Ok(failures)
}

/// Reads commands from stdin and starts each on its own task, so a slow
/// upload does not block a chart request typed after it.
async fn run_interactive(client: Arc<ChartDeskClient>) -> Result<()> {
    println!("{HELP}");
    let handle: Arc<dyn ClientHandle> = client;
    let mut inflight: Vec<JoinHandle<_>> = Vec::new();
    let mut lines = BufReader::new(stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{HELP}");
                continue;
            }
            _ => {}
        }
        match line.parse::<ControllerCommand>() {
            Ok(cmd) => {
                inflight.retain(|task: &JoinHandle<_>| !task.is_finished());
                inflight.push(dispatch(handle.clone(), cmd));
            }
            Err(err) => println!("{err}; type 'help' for commands"),
        }
    }

    for task in inflight {
        let _ = task.await;
    }
    Ok(())
}
