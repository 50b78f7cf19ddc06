use std::process::ExitStatus;
use thiserror::Error;

/// Errors caused by what the user asked for rather than by the network or disk.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Either a link or input file must be specified.")]
    NeitherSpecified,
    #[error("Both a link and input file cannot be included.")]
    BothSpecified,
    #[error("The audio track cannot be extracted from this video.")]
    AudioNotExtractable,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("No mp4 stream with a resolution of 360 is available for {0}.")]
    NoVideoStream(String),
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Format {0} has no download url.")]
    MissingUrl(String),
}

/// Short name of the error's kind, printed above the message on failure.
pub fn kind(error: &anyhow::Error) -> &'static str {
    if error.is::<ArgumentError>() {
        "ArgumentError"
    } else if error.is::<StreamError>() {
        "StreamError"
    } else if error.is::<std::io::Error>() {
        "IoError"
    } else if error.is::<reqwest::Error>() {
        "HttpError"
    } else if error.is::<serde_json::Error>() || error.is::<url::ParseError>() {
        "ParseError"
    } else if error.is::<tokio::task::JoinError>() {
        "JoinError"
    } else {
        "Error"
    }
}
