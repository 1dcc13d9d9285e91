use anyhow::{bail, Context};
use clap::Parser;
use ip_proxy_check::{
    logging,
    proxy::{run_http, LogReporter, SilentReporter, StatusReporter},
    Result, ValidatorConfig, DEFAULT_QUEUE_CAPACITY,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Validate HTTP proxies against an IP echo service
#[derive(Parser)]
#[command(name = "ip-proxy-check")]
#[command(about = "Validate HTTP proxies by checking the IP an echo service sees through them")]
struct Cli {
    /// Input file containing proxies, one URL per line
    #[arg(short, long, default_value = "res.txt")]
    input: PathBuf,

    /// Output file for valid proxies (truncated on start)
    #[arg(short, long, default_value = "success.txt")]
    output: PathBuf,

    /// Number of concurrent workers
    #[arg(short = 'n', long, default_value = "10")]
    workers: usize,

    /// Timeout in seconds for each probe
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// IP echo service to probe through each proxy
    #[arg(long, default_value = "http://ifconfig.me")]
    echo_url: String,

    /// Bounded queue size between the reader and the workers
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Query the echo service directly first and stop if it is unreachable
    #[arg(long)]
    preflight: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary_json: bool,

    /// Do not log a line per proxy
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let config = ValidatorConfig::new()
        .with_input(cli.input)
        .with_output(cli.output)
        .with_workers(cli.workers)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_echo_endpoint(cli.echo_url)
        .with_queue_capacity(cli.queue_capacity)
        .with_preflight(cli.preflight);

    let reporter: Arc<dyn StatusReporter> = if cli.quiet {
        Arc::new(SilentReporter)
    } else {
        Arc::new(LogReporter)
    };

    let summary = run_http(&config, reporter)
        .await
        .context("proxy validation failed")?;

    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
        println!("Saved {} valid proxies to {:?}", summary.valid, config.output_path);
    }

    if summary.sink_failures > 0 {
        bail!(
            "{} valid proxies could not be written to {:?}",
            summary.sink_failures,
            config.output_path
        );
    }

    Ok(())
}
