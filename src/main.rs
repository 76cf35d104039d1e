use anyhow::Context;
use api_conformance::cli::{CliArgs, OutputFormat};
use api_conformance::report::{TracingSink, render_run_report, render_text_summary, write_run_report};
use api_conformance::{ReqwestTransport, Runner, default_catalogs};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = installed {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}

async fn run(args: CliArgs) -> anyhow::Result<bool> {
    let config = args.load_config().context("invalid configuration")?;
    let transport = ReqwestTransport::from_config(&config).context("failed to build HTTP client")?;
    let selection = config.selection.clone();
    let catalogs = default_catalogs(&config);

    let mut runner = Runner::new(config, Arc::new(transport), Arc::new(TracingSink))
        .context("failed to initialize runner")?;
    let result = runner
        .run(&catalogs, &selection)
        .await
        .context("failed to generate test cases")?;

    if let Some(path) = &args.report {
        write_run_report(path, &result)?;
        info!(path = %path.display(), "wrote run report");
    }

    match args.format {
        OutputFormat::Text => print!("{}", render_text_summary(&result)),
        OutputFormat::Json => println!("{}", render_run_report(&result)?),
    }

    Ok(args.fail_on.should_fail(&result.summary))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.json_logs);

    match run(args).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
