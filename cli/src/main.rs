mod exec_cmd;
mod session_cmd;
mod share_cmd;
mod surface;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use url::Url;

use playpen_backend_client::HttpBackend;
use playpen_protocol::ExecutionKind;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

#[derive(Parser)]
#[command(name = "playpen", version, about = "Client for the playpen remote code runner")]
struct Cli {
    /// Backend base URL; falls back to PLAYPEN_BASE_URL, then localhost.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program in the remote sandbox.
    Run(exec_cmd::ExecArgs),
    /// Compile without running.
    Compile(exec_cmd::ExecArgs),
    /// Statically verify an Eiffel program.
    Verify(exec_cmd::ExecArgs),
    /// Inspect or reset the backend session.
    #[command(subcommand)]
    Session(session_cmd::SessionCommand),
    /// Encode and decode shareable workspace links.
    #[command(subcommand)]
    Share(share_cmd::ShareCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => exec_cmd::run(ExecutionKind::Run, args, cli.base_url).await,
        Command::Compile(args) => exec_cmd::run(ExecutionKind::Compile, args, cli.base_url).await,
        Command::Verify(args) => exec_cmd::run(ExecutionKind::Verify, args, cli.base_url).await,
        Command::Session(cmd) => session_cmd::run(cmd, cli.base_url).await,
        Command::Share(cmd) => share_cmd::run(cmd),
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn backend(base_url: Option<String>) -> Result<HttpBackend> {
    let raw = base_url
        .or_else(|| std::env::var("PLAYPEN_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let url = Url::parse(&raw).with_context(|| format!("invalid backend url `{raw}`"))?;
    Ok(HttpBackend::new(url))
}
