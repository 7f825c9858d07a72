//! dhcp-analyzer - passive DHCPv4 analyzer
//!
//! Prints decoded DHCP packets and optionally exports one Zipkin trace per
//! DHCP transaction.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use dhcp_analyzer::capture::PnetCapture;
use dhcp_analyzer::reporter::ConsoleReporter;
use dhcp_analyzer::tracer::{NoopTracer, Tracer, ZipkinTracer, DEFAULT_ZIPKIN_ENDPOINT};
use dhcp_analyzer::{Analyzer, Config, Mode};

#[derive(Parser, Debug)]
#[command(name = "dhcp-analyzer")]
#[command(version, about = "Passive DHCPv4 analyzer with Zipkin transaction tracing")]
struct Cli {
    /// Network device to capture on; lists devices when omitted
    #[arg(short, long, default_value = "")]
    device: String,

    /// Print the analysed DHCP packets to standard output
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    print: bool,

    /// Push the analysed DHCP packets to a Zipkin server
    #[arg(long)]
    zipkin: bool,

    /// Endpoint of the Zipkin server
    #[arg(long, default_value = DEFAULT_ZIPKIN_ENDPOINT)]
    zipkin_endpoint: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            device: cli.device,
            print: cli.print,
            zipkin: cli.zipkin,
            zipkin_endpoint: cli.zipkin_endpoint,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr, stdout carries the packet reports
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from(Cli::parse());

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<()> {
    config.validate()?;

    match config.mode() {
        Mode::ListDevices => {
            list_devices();
            Ok(())
        }
        Mode::Analyze(device) => analyze(&device, &config),
    }
}

fn list_devices() {
    println!("All available devices\n");
    for device in PnetCapture::list_interfaces() {
        let addresses = if device.addresses.is_empty() {
            "<none>".to_string()
        } else {
            device
                .addresses
                .iter()
                .map(|ip| ip.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        println!("{:<20} : {}", device.name, addresses);
    }
    println!("\nType -h for usage help.");
}

fn analyze(device: &str, config: &Config) -> Result<()> {
    let tracer: Box<dyn Tracer> = if config.zipkin {
        Box::new(
            ZipkinTracer::new(&config.zipkin_endpoint)
                .context("Failed to initialize Zipkin tracer")?,
        )
    } else {
        Box::new(NoopTracer::new())
    };

    let mut capture = PnetCapture::new(device)
        .with_context(|| format!("Error opening device {}", device))?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    // The banner is printed once the device is open, even without packet output
    let reporter = ConsoleReporter::new().with_packets(config.print);
    let mut analyzer = Analyzer::new(tracer)
        .with_running(running)
        .with_reporter(Box::new(reporter));

    analyzer
        .run(&mut capture)
        .with_context(|| format!("Error opening device {}", device))?;

    // Dropping the analyzer flushes pending spans
    drop(analyzer);
    Ok(())
}
