mod app;
mod args;
mod output;

use app::App;
use args::Args;
use clap::Parser;
use color_eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burst_cli=info,frame_grabber=info".into()),
        )
        .init();

    let args = Args::parse();
    let app = App::new(args);

    if let Err(error) = app.run().await {
        app.print_error(&error);
        std::process::exit(error.exit_code());
    }
    Ok(())
}
