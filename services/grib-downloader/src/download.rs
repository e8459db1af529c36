//! Streaming GRIB download to a uniquely named file.
//!
//! A download walks `Idle → CoordinatesValidated → RequestSent → Streaming →
//! Completed`, or stops in `Failed`. There is no retry: the first error is
//! returned, and a partially written file stays on disk for inspection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use grib_common::{Coordinates, DownloadRequest, GribError, GribResult, ProviderModel};

use crate::clock::{Clock, SystemClock};
use crate::progress::{ProgressEvent, ProgressReporter, PROGRESS_INTERVAL};
use crate::source::{ByteStream, GribSource, HttpGribSource};

/// Bytes per chunk written to disk; the final chunk may be shorter.
pub const CHUNK_SIZE: usize = 1024;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Whole-request timeout, body included
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Honour HTTP_PROXY / HTTPS_PROXY from the environment
    pub system_proxy: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(600), // 10 minutes
            connect_timeout: Duration::from_secs(30),
            user_agent: format!("grib-downloader/{}", env!("CARGO_PKG_VERSION")),
            system_proxy: true,
        }
    }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Absolute path of the written file
    pub path: PathBuf,
    pub bytes_written: u64,
    pub chunks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadPhase {
    Idle,
    CoordinatesValidated,
    RequestSent,
    Streaming,
}

impl fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownloadPhase::Idle => "idle",
            DownloadPhase::CoordinatesValidated => "coordinates_validated",
            DownloadPhase::RequestSent => "request_sent",
            DownloadPhase::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// `GRIB_<model>_<zone>_<ddmmYYYY-HHMMSS>.grb`
pub fn grib_file_name(model_name: &str, zone: &str, started_at: NaiveDateTime) -> String {
    format!(
        "GRIB_{}_{}_{}.grb",
        model_name,
        zone,
        started_at.format("%d%m%Y-%H%M%S")
    )
}

/// Absolute output directory; `None` or an empty path means the working directory.
fn resolve_dest_dir(dest_dir: Option<&Path>) -> GribResult<PathBuf> {
    let cwd = || {
        std::env::current_dir().map_err(|source| GribError::Write {
            path: PathBuf::from("."),
            source,
        })
    };

    match dest_dir {
        Some(dir) if !dir.as_os_str().is_empty() => {
            if dir.is_absolute() {
                Ok(dir.to_path_buf())
            } else {
                Ok(cwd()?.join(dir))
            }
        }
        _ => cwd(),
    }
}

/// Why a chunk ended before `CHUNK_SIZE` bytes besides end of body.
#[derive(Debug)]
enum ChunkStop {
    Cancelled,
    Failed(std::io::Error),
}

/// Read until `buf` is full, the body ends, or `cancel` fires.
///
/// Returns how many bytes landed in `buf` and, if the chunk was cut short by
/// a read error or cancellation, why. Bytes read before the stop are kept in
/// `buf`.
async fn fill_chunk<R>(
    reader: &mut R,
    buf: &mut [u8],
    cancel: &CancellationToken,
) -> (usize, Option<ChunkStop>)
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        // `read` is cancel safe, so dropping it here loses no data.
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            read = reader.read(&mut buf[filled..]) => Some(read),
        };
        match read {
            None => return (filled, Some(ChunkStop::Cancelled)),
            Some(Ok(0)) => break,
            Some(Ok(n)) => filled += n,
            Some(Err(e)) => return (filled, Some(ChunkStop::Failed(e))),
        }
    }
    (filled, None)
}

/// Copy `body` into `sink` in `CHUNK_SIZE` pieces.
///
/// Returns `(chunks, bytes)` written. On a read error or cancellation the
/// bytes already received are written before the error is returned.
async fn stream_body<W>(
    body: ByteStream,
    sink: &mut W,
    path: &Path,
    url: &str,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> GribResult<(u64, u64)>
where
    W: AsyncWrite + Unpin,
{
    let mut reader = StreamReader::new(body);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut chunks = 0u64;
    let mut bytes_written = 0u64;

    loop {
        let (filled, stop) = fill_chunk(&mut reader, &mut buf, cancel).await;

        if filled > 0 {
            sink.write_all(&buf[..filled])
                .await
                .map_err(|source| GribError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            chunks += 1;
            bytes_written += filled as u64;

            if chunks % PROGRESS_INTERVAL == 0 {
                progress.report(ProgressEvent::Chunks(chunks));
            }
        }

        match stop {
            Some(ChunkStop::Cancelled) => {
                debug!(bytes = bytes_written, "Cancelled while streaming");
                return Err(GribError::Cancelled {
                    url: url.to_string(),
                });
            }
            Some(ChunkStop::Failed(source)) => {
                debug!(bytes = bytes_written, "Body ended early");
                return Err(GribError::Network {
                    url: url.to_string(),
                    source: Box::new(source),
                });
            }
            None if filled < CHUNK_SIZE => return Ok((chunks, bytes_written)),
            None => {}
        }
    }
}

/// Downloads GRIB files. Holds no per-download state, so one instance can
/// serve concurrent downloads of independent requests.
pub struct GribDownloader {
    source: Arc<dyn GribSource>,
    clock: Arc<dyn Clock>,
}

impl GribDownloader {
    /// Create a downloader backed by `reqwest` and the system clock.
    pub fn new(config: DownloadConfig) -> GribResult<Self> {
        Ok(Self {
            source: Arc::new(HttpGribSource::new(&config)?),
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a downloader with custom collaborators.
    pub fn with_source(source: Arc<dyn GribSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    /// Download the GRIB file for `model`.
    ///
    /// `coordinates` override the model's zone; without them the model must
    /// already have a zone or coordinates selected.
    pub async fn download(
        &self,
        model: &ProviderModel,
        coordinates: Option<Coordinates>,
        dest_dir: Option<&Path>,
        progress: &dyn ProgressReporter,
    ) -> GribResult<DownloadResult> {
        self.download_with_cancel(
            model,
            coordinates,
            dest_dir,
            progress,
            &CancellationToken::new(),
        )
        .await
    }

    /// Like [`download`](Self::download), aborting when `cancel` fires.
    pub async fn download_with_cancel(
        &self,
        model: &ProviderModel,
        coordinates: Option<Coordinates>,
        dest_dir: Option<&Path>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> GribResult<DownloadResult> {
        let request = model.request(coordinates).inspect_err(|e| {
            debug!(model = %model.name(), phase = %DownloadPhase::Idle, error = %e, "Download failed");
        })?;
        self.download_request(&request, dest_dir, progress, cancel)
            .await
    }

    /// Stream an already built request to disk.
    #[instrument(skip(self, request, dest_dir, progress, cancel), fields(url = %request.url, zone = %request.zone_label()))]
    pub async fn download_request(
        &self,
        request: &DownloadRequest,
        dest_dir: Option<&Path>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> GribResult<DownloadResult> {
        let mut phase = DownloadPhase::CoordinatesValidated;
        let result = self
            .run(request, dest_dir, progress, cancel, &mut phase)
            .await;

        match &result {
            Ok(done) => info!(
                path = %done.path.display(),
                bytes = done.bytes_written,
                chunks = done.chunks,
                "GRIB file saved"
            ),
            Err(e) => warn!(phase = %phase, error = %e, "Download failed"),
        }
        result
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        dest_dir: Option<&Path>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
        phase: &mut DownloadPhase,
    ) -> GribResult<DownloadResult> {
        let started_at = self.clock.now();
        let dir = resolve_dest_dir(dest_dir)?;
        let path = dir.join(grib_file_name(
            &request.model_name,
            request.zone_label(),
            started_at,
        ));

        debug!(url = %request.url, bbox = ?request.bbox, "Connect to API");
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(GribError::Cancelled { url: request.url.clone() });
            }
            response = self.source.get(&request.url) => {
                response.map_err(|source| GribError::Network {
                    url: request.url.clone(),
                    source,
                })?
            }
        };
        *phase = DownloadPhase::RequestSent;

        if !response.is_success() {
            return Err(GribError::HttpStatus {
                status: response.status,
                url: request.url.clone(),
            });
        }

        debug!(path = %path.display(), "Write file");
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| GribError::Write {
                path: path.clone(),
                source,
            })?;
        *phase = DownloadPhase::Streaming;

        let streamed =
            stream_body(response.body, &mut file, &path, &request.url, progress, cancel).await;

        // Push buffered bytes out on every path; partial files are kept.
        let flushed = file.flush().await;
        let (chunks, bytes_written) = streamed?;
        flushed
            .and(file.sync_all().await)
            .map_err(|source| GribError::Write {
                path: path.clone(),
                source,
            })?;
        drop(file);

        progress.report(ProgressEvent::Completed {
            chunks,
            bytes: bytes_written,
        });

        Ok(DownloadResult {
            path,
            bytes_written,
            chunks,
        })
    }
}
