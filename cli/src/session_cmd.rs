use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use anyhow::bail;
use clap::Subcommand;

use playpen_core::CleanupOutcome;
use playpen_core::SessionTracker;

use crate::surface::TerminalSurface;

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Show the current backend session and its container.
    Info,
    /// Stop the session's container and drop the session.
    Cleanup {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(cmd: SessionCommand, base_url: Option<String>) -> Result<()> {
    let backend = Arc::new(crate::backend(base_url)?);
    let tracker = SessionTracker::new(backend, Arc::new(TerminalSurface));

    match cmd {
        SessionCommand::Info => {
            tracker.refresh().await?;
            Ok(())
        }
        SessionCommand::Cleanup { yes } => {
            if !yes && !confirm("This stops the session container and discards its state.")? {
                bail!("aborted");
            }
            match tracker.cleanup().await? {
                CleanupOutcome::Cleaned => Ok(()),
                CleanupOutcome::Refused { message } => bail!("cleanup refused: {message}"),
            }
        }
    }
}

fn confirm(warning: &str) -> Result<bool> {
    eprint!("{warning} Continue? [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
