use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::info;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use crate::download::{self, progress::ProgressRenderer, utils};
use crate::error::ArgumentError;
use crate::resolver::MediaBackend;

/// Download video or audio tracks from streaming-site links.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Single link to download
    #[arg(short = 'l', long)]
    pub link: Option<String>,

    /// Input file, containing one link per line
    #[arg(short = 'i', long)]
    pub input_file: Option<PathBuf>,

    /// Folder to write the result(s) to
    #[arg(short = 'f', long, default_value_os_t = default_folder())]
    pub folder: PathBuf,

    /// Only download the audio track(s)
    #[arg(short = 'a', long)]
    pub audio_only: bool,

    /// Download and hashing chunk size
    #[arg(short, long, default_value_t = 65_536)]
    pub chunk_size: usize,

    /// yt-dlp executable used to resolve links
    #[arg(long, env = "TUBE_DL_YT_DLP", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// ffmpeg executable used to extract audio tracks
    #[arg(long, env = "TUBE_DL_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Print debug logs
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(windows)]
fn default_folder() -> PathBuf {
    PathBuf::from(r"c:\temp\")
}

#[cfg(not(windows))]
fn default_folder() -> PathBuf {
    std::env::temp_dir()
}

fn is_specified(value: Option<&Path>) -> bool {
    value.is_some_and(|v| !v.as_os_str().to_string_lossy().trim().is_empty())
}

/// Parses and validates `args`. Anything wrong is printed with the full help
/// text and the process exits with code 1.
pub fn parse_or_exit<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => usage_and_exit(e.to_string().trim_end()),
    };
    if let Err(e) = cli.validate() {
        usage_and_exit(&e.to_string());
    }
    cli
}

fn usage_and_exit(message: &str) -> ! {
    println!("{message}");
    println!();
    println!("{}", Cli::command().render_help());
    process::exit(1);
}

impl Cli {
    /// Exactly one of `--link` and `--input-file` must be given. Blank values count as missing.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let link = is_specified(self.link.as_deref().map(Path::new));
        let input_file = is_specified(self.input_file.as_deref());
        match (link, input_file) {
            (false, false) => Err(ArgumentError::NeitherSpecified),
            (true, true) => Err(ArgumentError::BothSpecified),
            _ => Ok(()),
        }
    }

    /// Every line of the input file as is, or the single link.
    pub fn links(&self) -> Result<Vec<String>> {
        match &self.input_file {
            Some(path) if is_specified(Some(path.as_path())) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Could not read '{}'", path.display()))?;
                Ok(text.lines().map(str::to_owned).collect())
            }
            _ => Ok(self.link.iter().cloned().collect()),
        }
    }

    /// Downloads every link in order. The first failure stops the run.
    pub async fn execute<W>(
        self,
        backend: Arc<dyn MediaBackend>,
        renderer: Arc<ProgressRenderer<W>>,
    ) -> Result<()>
    where
        W: Write + Send + 'static,
    {
        if !self.folder.exists() {
            info!("Creating {}.", self.folder.display());
            fs::create_dir_all(&self.folder)?;
        }

        for link in self.links()? {
            let backend = Arc::clone(&backend);
            let renderer = Arc::clone(&renderer);
            let folder = self.folder.clone();
            let audio_only = self.audio_only;
            let chunk_size = self.chunk_size;
            let (path, hash) = tokio::task::spawn_blocking(move || -> Result<_> {
                let path = if audio_only {
                    download::download_audio(&*backend, &renderer, &link, &folder)?
                } else {
                    download::download_video(&*backend, &renderer, &link, &folder)?
                };
                renderer.finish();
                let hash = utils::hash_file(&path, chunk_size)?;
                Ok((path, hash))
            })
            .await??;
            info!(
                "File downloaded to {}; SHA256: {}.",
                path.display(),
                hex::encode(hash)
            );
        }
        Ok(())
    }
}
