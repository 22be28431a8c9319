use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gcodesender::report::{analysis_report, ToolpathReport};
use gcodesender::{
    analyze, build_toolpath, connection_params, init_logging, list_ports, load_program,
    workspace_from_settings, Config, MachineSession, SerialTransport, SessionHandle,
    LONG_VERSION, PUMP_INTERVAL,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[clap(author, version, long_version = LONG_VERSION, about, long_about = None)]
struct Args {
    /// Settings file (TOML or JSON); defaults to the platform config directory
    #[clap(long, value_parser, global = true)]
    config: Option<PathBuf>,

    /// Verbose
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print bounds, estimated time and warnings of a program
    Analyze {
        #[clap(value_parser)]
        file: PathBuf,
    },
    /// Print the toolpath, workspace grid and fitted view as JSON
    Toolpath {
        #[clap(value_parser)]
        file: PathBuf,

        #[clap(long, default_value_t = 800.0)]
        view_width: f64,

        #[clap(long, default_value_t = 600.0)]
        view_height: f64,
    },
    /// List serial ports
    Ports,
    /// Stream a program to the machine
    Send {
        #[clap(value_parser)]
        file: PathBuf,

        /// Serial port; overrides the settings
        #[clap(short, long)]
        port: Option<String>,

        /// Baud rate; overrides the settings
        #[clap(short, long)]
        baud: Option<u32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    Config::load_or_default(&path)
        .with_context(|| format!("Failed to load settings: {}", path.display()))
}

fn run_analyze(file: &Path) -> Result<()> {
    let program = load_program(file)?;
    let result = analyze(&program.commands);
    print!("{}", analysis_report(&program, &result));
    Ok(())
}

fn run_toolpath(config: &Config, file: &Path, view_width: f64, view_height: f64) -> Result<()> {
    let program = load_program(file)?;
    let toolpath = build_toolpath(&program.commands);
    let report = ToolpathReport::new(
        workspace_from_settings(&config.workspace),
        toolpath,
        view_width,
        view_height,
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        println!("{}\t{}", port.port_name, port.description);
    }
    Ok(())
}

async fn run_send(
    config: &Config,
    file: &Path,
    port: Option<&str>,
    baud: Option<u32>,
) -> Result<()> {
    let program = load_program(file)?;
    let params = connection_params(&config.connection, port, baud);
    if params.port.is_empty() {
        anyhow::bail!("no serial port given; use --port or set connection.port");
    }

    let mut session =
        MachineSession::with_scrollback(Box::new(SerialTransport::new()), config.console.scrollback);
    session.connect(&params)?;
    let total = session.send_program(
        &program.commands,
        &config.program.preamble,
        &config.program.postamble,
    )?;
    info!("sending {} ({} commands)", program.name, total);

    let handle = SessionHandle::new(session);
    let pump = handle.spawn_pump(PUMP_INTERVAL);
    let mut poll = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted");
                handle.lock().emergency_stop();
                break;
            }
            _ = poll.tick() => {
                let session = handle.lock();
                let queue = session.queue();
                if !session.is_connected() || (queue.is_empty() && !queue.is_awaiting_ack()) {
                    break;
                }
            }
        }
    }

    pump.stop().await;

    let mut session = handle.lock();
    session.disconnect();
    for entry in session.transcript().lines() {
        println!("{}", entry.text);
    }
    for warning in session.warnings().warnings() {
        eprintln!("warning [{}]: {}", warning.group, warning.message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    match &args.command {
        Commands::Analyze { file } => run_analyze(file),
        Commands::Toolpath {
            file,
            view_width,
            view_height,
        } => {
            let config = load_config(args.config.as_ref())?;
            run_toolpath(&config, file, *view_width, *view_height)
        }
        Commands::Ports => run_ports(),
        Commands::Send { file, port, baud } => {
            let config = load_config(args.config.as_ref())?;
            run_send(&config, file, port.as_deref(), *baud).await
        }
    }
}
