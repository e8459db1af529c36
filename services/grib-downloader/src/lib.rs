//! GRIB downloader: turns a provider model plus a zone or coordinates into a
//! file on disk.
//!
//! The library exposes the streaming download and its collaborator seams
//! (HTTP source, clock, progress reporting) so the binary and tests can plug
//! their own implementations in.

pub mod clock;
pub mod config;
pub mod download;
pub mod progress;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use download::{grib_file_name, DownloadConfig, DownloadResult, GribDownloader, CHUNK_SIZE};
pub use progress::{ConsoleProgress, NoProgress, ProgressEvent, ProgressReporter, PROGRESS_INTERVAL};
pub use source::{ByteStream, GribSource, HttpGribSource, SourceResponse};
