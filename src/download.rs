//! Torrent file download and naming.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Response;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::api::client::parse_envelope;
use crate::error::{GazelleError, Result};

/// Message of the error raised for a file-shaped destination.
pub const FILENAME_IN_PATH: &str = "path cannot contain a filename";

const TORRENT_EXTENSION: &str = ".torrent";

/// Check that `dir` names a directory and return it as a path.
///
/// The destination must end with a path separator, and must not be an
/// existing regular file. No I/O beyond a metadata lookup happens here.
///
/// # Errors
///
/// Returns `InvalidArgument("path cannot contain a filename")`.
pub fn validate_destination<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let text = dir.to_string_lossy();

    let is_separator = |c: char| c == '/' || c == MAIN_SEPARATOR;
    let trimmed = text.trim_end_matches(is_separator);

    let has_trailing_separator = text.ends_with(is_separator);
    let names_existing_file = !trimmed.is_empty() && Path::new(trimmed).is_file();
    if !has_trailing_separator || names_existing_file {
        return Err(GazelleError::InvalidArgument(FILENAME_IN_PATH.to_string()));
    }

    Ok(dir.to_path_buf())
}

/// Get the torrent file name from a response's `content-disposition` header.
///
/// The server names files `<title>-<torrent id>.torrent`; the id suffix is
/// removed, giving `<title>.torrent`.
///
/// # Errors
///
/// Returns `Api` if the header is missing or carries no file name.
pub fn extract_filename(headers: &HeaderMap) -> Result<String> {
    let name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition)
        .ok_or_else(|| GazelleError::Api("response carried no torrent file name".to_string()))?;

    Ok(strip_torrent_id(&name))
}

/// Parse the file name out of a Content-Disposition value.
///
/// Handles `filename="a b.torrent"`, `filename=a.torrent` and the RFC 5987
/// `filename*=UTF-8''a%20b.torrent` form.
fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();

    if let Some(quoted) = value.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some(quoted[..end].to_string());
    }

    let end = value.find(';').unwrap_or(value.len());
    let name = value[..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Turn `<title>-<digits>.torrent` into `<title>.torrent`.
fn strip_torrent_id(name: &str) -> String {
    if let Some(stem) = name.strip_suffix(TORRENT_EXTENSION) {
        if let Some((title, id)) = stem.rsplit_once('-') {
            if !title.is_empty() && !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
                return format!("{}{}", title, TORRENT_EXTENSION);
            }
        }
    }
    name.to_string()
}

/// Sanitize a string for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
        .trim()
        .to_string()
}

/// Write a download response into `dir` and return the file path.
///
/// A JSON body means the server refused the download; its error is
/// surfaced as `Api`.
pub(crate) async fn persist(response: Response, dir: &Path) -> Result<PathBuf> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));
    if is_json {
        let status = response.status();
        let text = response.text().await?;
        parse_envelope(status, &text)?;
        return Err(GazelleError::Api(
            "expected a torrent file, got a JSON payload".to_string(),
        ));
    }

    let filename = sanitize_filename(&extract_filename(response.headers())?);
    fs::create_dir_all(dir).await?;
    let path = dir.join(&filename);

    debug!(path = %path.display(), "Writing torrent file");
    let size = write_stream(response.bytes_stream(), &path).await?;

    info!(path = %path.display(), size, "Downloaded torrent");
    Ok(path)
}

/// Write a byte stream into a new file at `path`, returning the byte count.
///
/// If the stream or a write fails, the partial file is removed.
async fn write_stream<S, E>(stream: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    GazelleError: From<E>,
{
    match write_chunks(stream, path).await {
        Ok(size) => Ok(size),
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(path).await {
                warn!(path = %path.display(), "Could not remove partial torrent: {}", cleanup);
            }
            Err(e)
        }
    }
}

async fn write_chunks<S, E>(stream: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    GazelleError: From<E>,
{
    futures_util::pin_mut!(stream);
    let mut file = fs::File::create(path).await?;
    let mut size: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}
