//!
//! Command-line utility to list PrintNode printers or print a badge
//!

use std::{error::Error, process::ExitCode, time::Duration};

use clap::Parser;
use futures_util::StreamExt;
use log::debug;

use badgeprint::{prelude::*, util};

fn new_client(params: &PrintParams) -> PrintNodeClient {
    let mut builder = PrintNodeClient::builder(&params.api_key);
    if let Some(ref url) = params.base_url {
        builder = builder.base_url(url);
    }
    if let Some(timeout) = params.timeout {
        builder = builder.request_timeout(Duration::from_secs(timeout));
    }

    for param in &params.headers {
        if let Some((k, v)) = param.split_once('=') {
            builder = builder.http_header(k, v);
        }
    }

    builder.build()
}

async fn do_printers(params: &PrintParams, cmd: PrintersCmd) -> Result<ExitCode, Box<dyn Error>> {
    let client = new_client(params);
    let targets = util::discover_targets(&client, Duration::from_secs(cmd.discovery_timeout)).await?;

    let mut listed = match cmd.search {
        Some(ref query) => util::search_targets(&targets, query),
        None => targets.iter().collect(),
    };
    if cmd.online {
        listed.retain(|t| t.is_online());
    }

    for target in listed {
        let caps = &target.capabilities;
        println!(
            "{}: {} [{}] color={} duplex={} papers={}",
            target.id,
            target.display_name,
            if target.is_online() { "online" } else { "offline" },
            caps.supports_color,
            caps.supports_duplex,
            caps.paper_formats.iter().cloned().collect::<Vec<_>>().join(",")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn new_request(cmd: &PrintCmd) -> Result<PrintJobRequest, PrintError> {
    let mut builder = PrintJobRequest::builder(cmd.locator.parse()?)
        .copies(cmd.copies)
        .color(!cmd.no_color)
        .high_quality(cmd.high_quality);

    if let Some(ref printer) = cmd.printer {
        builder = builder.target(printer.as_str());
    }
    if cmd.landscape {
        builder = builder.orientation(Orientation::Landscape);
    }
    if let Some(ref paper) = cmd.paper {
        builder = builder.paper_format(paper);
    }
    if let Some(duplex) = cmd.duplex {
        builder = builder.duplex(duplex.into());
    }
    if let Some(ref title) = cmd.title {
        builder = builder.title(title);
    }

    builder.build()
}

async fn do_print(params: &PrintParams, cmd: PrintCmd) -> Result<ExitCode, Box<dyn Error>> {
    let request = new_request(&cmd)?;
    let locale = params.locale.parse::<Locale>()?;

    let orchestrator = PrintJobOrchestrator::builder(new_client(params))
        .fetch_timeout(Duration::from_secs(cmd.fetch_timeout))
        .settle_delay(Duration::from_millis(cmd.settle_ms))
        .locale(locale)
        .build();

    let updates = Box::pin(orchestrator.channel().updates());
    let watcher = tokio::spawn(async move {
        // first item is the idle state before the attempt starts
        let mut updates = updates.skip(1);
        while let Some(update) = updates.next().await {
            println!("[{}] {}: {}", update.attempt, update.status, update.status.message(locale));
        }
    });

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted, cancelling print attempt");
            on_interrupt.cancel();
        }
    });

    let outcome = orchestrator.print_with_cancel(&request, &cancel).await;
    watcher.abort();

    println!("{} ({} ms)", outcome.message, outcome.duration_ms);
    if let Some(job_id) = outcome.job_id {
        println!("job-id: {job_id}");
    }
    if let Some(ref detail) = outcome.detail {
        if outcome.status.is_unexpected() {
            eprintln!("error: {detail}");
        } else {
            println!("{detail}");
        }
    }

    Ok(if outcome.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[derive(Parser)]
#[clap(about = "PrintNode badge printing utility", name = "badgeprint", rename_all = "kebab-case")]
struct PrintParams {
    #[clap(long = "api-key", short = 'k', env = "PRINTNODE_API_KEY", hide_env_values = true, help = "PrintNode API key")]
    api_key: String,

    #[clap(long = "base-url", global = true, help = "PrintNode API endpoint [default: public API]")]
    base_url: Option<String>,

    #[clap(
        long = "timeout",
        short = 't',
        global = true,
        help = "API request timeout in seconds [default: 30]"
    )]
    timeout: Option<u64>,

    #[clap(long = "header", short = 'H', global = true, help = "Extra HTTP headers in key=value format")]
    headers: Vec<String>,

    #[clap(long = "locale", short = 'l', global = true, default_value = "en", help = "Status message language (en, fr)")]
    locale: String,

    #[clap(subcommand)]
    command: PrintCommand,
}

#[derive(Parser)]
enum PrintCommand {
    #[clap(name = "printers", about = "List printers known to PrintNode")]
    Printers(PrintersCmd),
    #[clap(name = "print", about = "Print a document on a PrintNode printer")]
    Print(PrintCmd),
}

#[derive(Parser, Clone)]
#[clap(rename_all = "kebab-case")]
struct PrintersCmd {
    #[clap(long = "online", short = 'o', help = "Only list printers that are online")]
    online: bool,

    #[clap(long = "search", short = 's', help = "Filter by name, description or id")]
    search: Option<String>,

    #[clap(long = "discovery-timeout", default_value_t = 8, help = "Discovery timeout in seconds")]
    discovery_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum DuplexArg {
    LongEdge,
    ShortEdge,
}

impl From<DuplexArg> for Duplex {
    fn from(arg: DuplexArg) -> Self {
        match arg {
            DuplexArg::LongEdge => Duplex::LongEdge,
            DuplexArg::ShortEdge => Duplex::ShortEdge,
        }
    }
}

#[derive(Parser, Clone)]
#[clap(rename_all = "kebab-case")]
struct PrintCmd {
    #[clap(help = "Document locator: file:///path/to/badge.pdf or https://host/badge.pdf")]
    locator: String,

    #[clap(long = "printer", short = 'p', help = "Printer id")]
    printer: Option<String>,

    #[clap(long = "copies", short = 'n', default_value_t = 1, help = "Number of copies")]
    copies: u32,

    #[clap(long = "high-quality", short = 'q', help = "Print at 600 dpi instead of 300 dpi")]
    high_quality: bool,

    #[clap(long = "landscape", help = "Landscape orientation")]
    landscape: bool,

    #[clap(long = "no-color", help = "Print in monochrome")]
    no_color: bool,

    #[clap(long = "paper", help = "Paper format name as reported by the printer")]
    paper: Option<String>,

    #[clap(long = "duplex", value_enum, help = "Print on both sides")]
    duplex: Option<DuplexArg>,

    #[clap(long = "title", short = 'j', help = "Job title")]
    title: Option<String>,

    #[clap(long = "settle-ms", default_value_t = 1000, help = "Delay before reporting the final status")]
    settle_ms: u64,

    #[clap(long = "fetch-timeout", default_value_t = 10, help = "Document download timeout in seconds")]
    fetch_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    env_logger::init();

    let params = PrintParams::parse();

    match params.command {
        PrintCommand::Printers(ref cmd) => do_printers(&params, cmd.clone()).await,
        PrintCommand::Print(ref cmd) => do_print(&params, cmd.clone()).await,
    }
}
