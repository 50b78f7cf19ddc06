use anyhow::{Context, Result};
use log::debug;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::error::StreamError;

/// Copies the audio track of `source` into `destination` with ffmpeg. The
/// container is picked by ffmpeg from the destination's extension.
pub fn extract_audio(
    ffmpeg: &Path,
    source: &Path,
    destination: &Path,
    duration: Option<Duration>,
    progress: impl Fn(f64),
) -> Result<()> {
    let mut command = Command::new(ffmpeg);
    command
        .args(["-y", "-hide_banner", "-loglevel", "error", "-nostats"])
        .args(["-progress", "pipe:1", "-i"])
        .arg(source)
        .args(["-vn", "-acodec", "copy"])
        .arg(destination)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("Running {:?}", command);

    let mut child = command
        .spawn()
        .with_context(|| format!("Could not run {}", ffmpeg.display()))?;

    // Drained on its own thread so a chatty ffmpeg can't fill the pipe and
    // stall while stdout is being read.
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut stderr = Vec::new();
            let _ = pipe.read_to_end(&mut stderr);
            String::from_utf8_lossy(&stderr).into_owned()
        })
    });

    progress(0.0);
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            if let Some(percent) = parse_progress(&line?, duration) {
                progress(percent);
            }
        }
    }

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    let status = child.wait()?;
    if !status.success() {
        return Err(StreamError::ToolFailed {
            tool: ffmpeg.display().to_string(),
            status,
            stderr: stderr.trim().to_owned(),
        }
        .into());
    }
    Ok(())
}

/// Reads one `key=value` line of ffmpeg's `-progress` output.
fn parse_progress(line: &str, duration: Option<Duration>) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "progress" if value == "end" => Some(100.0),
        // out_time_ms is microseconds too, for historical reasons.
        "out_time_us" | "out_time_ms" => {
            let total = duration?.as_micros() as f64;
            let done = value.parse::<i64>().ok()?.max(0) as f64;
            Some((done / total * 100.0).min(100.0))
        }
        _ => None,
    }
}
