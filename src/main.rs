use clap::error::ErrorKind;
use clap::Parser;
use html_shot::{load_config, setup_logging, Cli, CliRunner, ScreenshotError};
use tracing::{debug, warn};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => exit_on_parse_error(e),
    };

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("{e}");
    }

    debug!("Starting html-shot v{}", env!("CARGO_PKG_VERSION"));

    println!("🎬 Generating screenshot...\n");

    let result = tokio::select! {
        result = run(&args) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, aborting render");
            std::process::exit(130);
        }
    };

    match result {
        Ok(()) => println!("\n🎉 Screenshot generated successfully!"),
        Err(e) => {
            eprintln!("\n❌ Error: {e:#}");
            let usage = e
                .downcast_ref::<ScreenshotError>()
                .is_some_and(ScreenshotError::is_usage_error);
            if usage {
                eprintln!("Run with --help for usage.");
            }
            std::process::exit(1);
        }
    }
}

async fn run(args: &Cli) -> anyhow::Result<()> {
    let config = load_config(args).await?;
    let runner = CliRunner::new(config)?;
    runner.run(args).await?;
    Ok(())
}

/// Help and version go to stdout with status 0; every usage error exits with 1
fn exit_on_parse_error(e: clap::Error) -> ! {
    match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = e.print();
            std::process::exit(0);
        }
        _ => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}
