use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Subcommand;
use url::Url;

use playpen_protocol::Language;
use playpen_protocol::SourceFile;
use playpen_share_link::ShareState;
use playpen_share_link::decode_query_pairs;
use playpen_share_link::decode_url;
use playpen_share_link::encode;
use playpen_share_link::encode_uncompressed;
use playpen_share_link::share_url;

#[derive(Subcommand)]
pub enum ShareCommand {
    /// Build a share token (or full link) from source files.
    Encode {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Language; inferred from file extensions when omitted.
        #[arg(long)]
        lang: Option<Language>,

        /// File to open first; defaults to the first file.
        #[arg(long)]
        active: Option<String>,

        /// Skip compression; longer token, same decoder.
        #[arg(long)]
        plain: bool,

        /// Emit a full URL against this base instead of a bare token.
        #[arg(long)]
        url: Option<Url>,
    },
    /// Decode a share link or bare token and print the workspace.
    Decode {
        link: String,

        /// Write the files into this directory instead of printing them.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run(cmd: ShareCommand) -> Result<()> {
    match cmd {
        ShareCommand::Encode {
            files,
            lang,
            active,
            plain,
            url,
        } => encode_cmd(&files, lang, active, plain, url),
        ShareCommand::Decode { link, out } => decode_cmd(&link, out.as_deref()),
    }
}

fn encode_cmd(
    paths: &[PathBuf],
    lang: Option<Language>,
    active: Option<String>,
    plain: bool,
    url: Option<Url>,
) -> Result<()> {
    let files = paths
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
        .collect::<Result<Vec<_>>>()?;
    let language = match lang {
        Some(lang) => lang,
        None => files
            .iter()
            .find_map(|file| {
                Path::new(&file.name)
                    .extension()
                    .and_then(|ext| Language::from_extension(&ext.to_string_lossy()))
            })
            .context("cannot infer the language from file extensions; pass --lang")?,
    };
    let state = ShareState::new(language, files, active)?;

    match (url, plain) {
        (Some(base), false) => println!("{}", share_url(&base, &state)?),
        (Some(mut base), true) => {
            let token = encode_uncompressed(&state)?;
            base.query_pairs_mut().append_pair("c", &token);
            println!("{base}");
        }
        (None, false) => println!("{}", encode(&state)?),
        (None, true) => println!("{}", encode_uncompressed(&state)?),
    }
    Ok(())
}

fn decode_cmd(link: &str, out: Option<&Path>) -> Result<()> {
    let state = match Url::parse(link) {
        Ok(url) => decode_url(&url),
        // A bare token is shorthand for `?c=<token>`.
        Err(_) => decode_query_pairs(&[("c".to_string(), link.to_string())]),
    };
    let Some(state) = state else {
        bail!("the link carries no decodable share payload");
    };

    match out {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
            for file in &state.files {
                // File names come from an untrusted token; refuse anything
                // that would land outside the target directory.
                ensure_plain_file_name(&file.name)?;
                let path = dir.join(&file.name);
                std::fs::write(&path, &file.content)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }
            eprintln!(
                "wrote {} {} file(s) to {}",
                state.files.len(),
                state.language,
                dir.display(),
            );
        }
        None => {
            eprintln!("lang: {}", state.language);
            eprintln!("active: {}", state.active_file);
            for file in &state.files {
                println!("--- {}", file.name);
                print!("{}", file.content);
                if !file.content.ends_with('\n') {
                    println!();
                }
            }
        }
    }
    Ok(())
}

fn ensure_plain_file_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let plain = matches!(components.next(), Some(std::path::Component::Normal(_)))
        && components.next().is_none()
        && !name.contains('\\');
    if !plain {
        bail!("refusing to write file name {name:?}: not a plain file name");
    }
    Ok(())
}
