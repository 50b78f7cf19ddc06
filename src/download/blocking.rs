use anyhow::Result;
use indicatif::{HumanBytes, HumanDuration};
use log::debug;
use reqwest::blocking::Client;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use crate::error::StreamError;
use crate::resolver::StreamDescriptor;

/// A blocking client without a request timeout. Must be built off the async runtime.
pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(None)
        .build()?)
}

/// Streams the descriptor's url into `destination`, overwriting it, and reports
/// each whole percent reached. Returns the number of bytes written.
pub fn fetch_to_file(
    client: &Client,
    descriptor: &StreamDescriptor,
    destination: &Path,
    chunk_size: usize,
    progress: impl Fn(f64),
) -> Result<u64> {
    let url = descriptor
        .download_url
        .clone()
        .ok_or_else(|| StreamError::MissingUrl(descriptor.format_id.clone()))?;

    let mut request = client.get(url);
    for (name, value) in &descriptor.http_headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let mut response = request.send()?.error_for_status()?;
    let content_length = response.content_length().filter(|len| *len > 0);

    let mut dest = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(destination)?;

    let start_time = Instant::now();
    let mut downloaded = 0u64;
    let mut last_percent = Some(0);
    let mut buffer = vec![0; chunk_size.max(1)];
    progress(0.0);
    loop {
        let data = response.read(&mut buffer[..])?;
        if data == 0 {
            break;
        }
        dest.write_all(&buffer[..data])?;
        downloaded += data as u64;

        if let Some(len) = content_length {
            let percent = percent_of(downloaded, len);
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                progress(percent as f64);
            }
        }
    }
    dest.sync_all()?;
    if last_percent != Some(100) {
        progress(100.0);
    }

    debug!(
        "Downloaded {} to '{}' in {}.",
        HumanBytes(downloaded),
        destination.display(),
        HumanDuration(start_time.elapsed())
    );
    Ok(downloaded)
}

fn percent_of(downloaded: u64, total: u64) -> u8 {
    (downloaded.saturating_mul(100) / total).min(100) as u8
}
