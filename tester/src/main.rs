use chat_tester::{run_scenario, Driver};
use clap::Parser;

/// Exercise model registration, selection and conversation reset against a
/// running chat server.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Model artifact to register
    #[arg(long, env = "CHAT_MODEL_PATH")]
    model_path: String,
    /// Optional display name for the model
    #[arg(long)]
    display_name: Option<String>,
    /// Base URL of the chat server
    #[arg(long, env = "CHAT_URL", default_value = "http://127.0.0.1:8080")]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let driver = Driver::new(&args.url);
    run_scenario(
        &driver,
        &args.model_path,
        args.display_name.as_deref(),
        |step, body| println!("{step}: {body:#}"),
    )
    .await?;
    Ok(())
}
