use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Args;

use playpen_core::ExecStatus;
use playpen_core::ExecutionController;
use playpen_core::SubmissionOutcome;
use playpen_core::SubmitPayload;
use playpen_protocol::ExecutionKind;
use playpen_protocol::Language;
use playpen_protocol::SourceFile;

use crate::surface::TerminalSurface;

#[derive(Args)]
pub struct ExecArgs {
    /// Source files; the first is the entry point unless --main is given.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Language; inferred from file extensions when omitted.
    #[arg(long)]
    pub lang: Option<Language>,

    /// Entry-point file name within the submitted set.
    #[arg(long)]
    pub main: Option<String>,

    /// Execution time limit in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Compile first, then run against the produced artifacts instead of
    /// letting the backend compile again.
    #[arg(long)]
    pub use_compiled: bool,
}

pub async fn run(kind: ExecutionKind, args: ExecArgs, base_url: Option<String>) -> Result<()> {
    let backend = Arc::new(crate::backend(base_url)?);
    let controller = ExecutionController::new(backend, Arc::new(TerminalSurface));

    let files = load_files(&args.files)?;
    let language = match args.lang {
        Some(lang) => lang,
        None => infer_language(&files)?,
    };
    let main_file = match args.main {
        Some(main) => main,
        None => files[0].name.clone(),
    };

    if args.use_compiled && kind == ExecutionKind::Run {
        let compile = SubmitPayload {
            kind: ExecutionKind::Compile,
            language,
            files: files.clone(),
            main_file: main_file.clone(),
            timeout: args.timeout,
            use_compiled: false,
        };
        let compiled = match controller.submit(compile).await? {
            SubmissionOutcome::Finished(result) => Some(result),
            SubmissionOutcome::Started { .. } => controller.wait().await,
        };
        match compiled {
            Some(result) if result.status == ExecStatus::Completed => {}
            Some(result) => bail!("compilation failed: {}", result.message),
            None => bail!("compilation produced no verdict"),
        }
    }

    let payload = SubmitPayload {
        kind,
        language,
        files,
        main_file,
        timeout: args.timeout,
        use_compiled: args.use_compiled,
    };

    let result = match controller.submit(payload).await? {
        SubmissionOutcome::Finished(result) => Some(result),
        SubmissionOutcome::Started { .. } => {
            let canceller = controller.clone();
            let ctrl_c = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    match canceller.cancel().await {
                        Ok(outcome) => tracing::info!(?outcome, "cancellation requested"),
                        Err(err) => tracing::warn!("cancellation failed: {err}"),
                    }
                }
            });
            let result = controller.wait().await;
            ctrl_c.abort();
            result
        }
    };

    match result {
        Some(result) if result.status == ExecStatus::Completed => Ok(()),
        Some(result) => bail!(
            "{} did not succeed: {}",
            kind.as_str(),
            if result.message.is_empty() {
                "no verdict".to_string()
            } else {
                result.message
            }
        ),
        None => bail!("{} produced no verdict", kind.as_str()),
    }
}

fn load_files(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("{} has no file name", path.display()))?;
            Ok(SourceFile::new(name, content))
        })
        .collect()
}

fn infer_language(files: &[SourceFile]) -> Result<Language> {
    for file in files {
        let ext = Path::new(&file.name)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
        if let Some(lang) = ext.as_deref().and_then(Language::from_extension) {
            return Ok(lang);
        }
    }
    bail!("cannot infer the language from file extensions; pass --lang")
}
