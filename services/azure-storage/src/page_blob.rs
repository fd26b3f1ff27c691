use std::fmt::{Debug, Formatter};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use azrest_core::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use log::{debug, info};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};

use crate::blob::encode_path;
use crate::constants::*;
use crate::BlobClient;

/// Inclusive byte range of a page blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u64,
    end: u64,
}

impl PageRange {
    /// Create a range covering `start..=end`.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(Error::invalid_argument(format!(
                "page range {start}-{end} ends before it starts"
            )));
        }
        Ok(Self { start, end })
    }

    /// First byte.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered.
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    fn is_aligned(&self) -> bool {
        self.start % PAGE_SIZE == 0 && self.size() % PAGE_SIZE == 0
    }
}

/// Callback receiving upload progress in percent.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Upload of a local VHD file into a page blob.
///
/// Only the non-empty 4 MiB chunks are written. Ranges listed with
/// [`VhdUpload::with_skip_ranges`] are known to be empty and never read.
#[derive(Clone)]
pub struct VhdUpload {
    path: PathBuf,
    blob_name: Option<String>,
    skip: Vec<PageRange>,
    workers: usize,
    progress: Option<ProgressFn>,
}

impl Debug for VhdUpload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VhdUpload")
            .field("path", &self.path)
            .field("blob_name", &self.blob_name)
            .field("skip", &self.skip)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl VhdUpload {
    /// Upload the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blob_name: None,
            skip: Vec::new(),
            workers: DEFAULT_UPLOAD_WORKERS,
            progress: None,
        }
    }

    /// Name of the blob, defaults to the file name.
    pub fn with_blob_name(mut self, name: impl Into<String>) -> Self {
        self.blob_name = Some(name.into());
        self
    }

    /// Ranges known to be empty. They must be aligned to 512 bytes.
    pub fn with_skip_ranges(mut self, skip: Vec<PageRange>) -> Self {
        self.skip = skip;
        self
    }

    /// Number of concurrent page writes, at least one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Report progress in percent after each written range.
    pub fn with_progress(mut self, progress: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    fn blob_name(&self) -> Result<String> {
        if let Some(name) = &self.blob_name {
            return Ok(name.clone());
        }
        self.path
            .file_name()
            .and_then(|v| v.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::invalid_argument(format!("{} has no file name", self.path.display()))
            })
    }
}

/// Cut `size` bytes into chunks of `PAGE_CHUNK_SIZE` and remove the `skip` ranges.
pub(crate) fn chunk_ranges(size: u64, skip: &[PageRange]) -> Vec<PageRange> {
    let mut skip = skip.to_vec();
    skip.sort_by_key(|r| r.start);

    let mut ranges = Vec::new();
    let mut start = 0;
    while start < size {
        let end = (start + PAGE_CHUNK_SIZE).min(size) - 1;
        let mut cursor = start;
        for s in skip.iter().filter(|s| s.end >= start && s.start <= end) {
            if s.start > cursor {
                ranges.push(PageRange {
                    start: cursor,
                    end: s.start - 1,
                });
            }
            cursor = cursor.max(s.end + 1);
        }
        if cursor <= end {
            ranges.push(PageRange { start: cursor, end });
        }
        start = end + 1;
    }
    ranges
}

async fn read_range(file: &mut File, range: PageRange) -> Result<Vec<u8>> {
    let mut buf = vec![0; range.size() as usize];
    file.seek(SeekFrom::Start(range.start)).await?;
    file.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Drop the ranges whose bytes are all zero.
async fn non_empty_ranges(path: &Path, ranges: Vec<PageRange>) -> Result<Vec<PageRange>> {
    let mut file = File::open(path).await?;
    let mut kept = Vec::with_capacity(ranges.len());
    for range in ranges {
        let data = read_range(&mut file, range).await?;
        if data.iter().any(|b| *b != 0) {
            kept.push(range);
        }
    }
    Ok(kept)
}

fn join_result(res: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    match res {
        Ok(res) => res,
        Err(err) if err.is_cancelled() => {
            Err(Error::canceled("page upload worker was cancelled").with_source(err))
        }
        Err(err) => Err(Error::unexpected("page upload worker panicked").with_source(err)),
    }
}

struct Progress {
    processed: AtomicU64,
    total: u64,
    report: Option<ProgressFn>,
}

impl Progress {
    fn add(&self, n: u64) {
        let processed = self.processed.fetch_add(n, Ordering::SeqCst) + n;
        if let Some(report) = &self.report {
            let percent = if self.total == 0 {
                100.0
            } else {
                processed as f64 * 100.0 / self.total as f64
            };
            report(percent);
        }
    }
}

type PageQueue = Arc<Mutex<mpsc::Receiver<(PageRange, Bytes)>>>;

impl BlobClient {
    /// Write one range of a page blob.
    pub async fn put_page(
        &self,
        container: &str,
        blob: &str,
        range: PageRange,
        data: Bytes,
    ) -> Result<()> {
        if !range.is_aligned() || range.size() != data.len() as u64 {
            return Err(Error::invalid_argument(format!(
                "page range {}-{} does not match 512 byte pages of the data",
                range.start, range.end
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(X_MS_PAGE_WRITE, HeaderValue::from_static("update"));
        headers.insert(
            X_MS_RANGE,
            format!("bytes={}-{}", range.start, range.end).parse()?,
        );
        self.send(
            Method::PUT,
            &encode_path(container, blob),
            &[("comp", "page")],
            headers,
            data,
        )
        .await?;
        Ok(())
    }

    /// Create an empty page blob of `size` bytes.
    pub async fn create_page_blob(&self, container: &str, blob: &str, size: u64) -> Result<()> {
        if size % PAGE_SIZE != 0 {
            return Err(Error::invalid_argument(format!(
                "page blob size {size} is not a multiple of {PAGE_SIZE}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(X_MS_BLOB_TYPE, HeaderValue::from_static("PageBlob"));
        headers.insert(X_MS_BLOB_CONTENT_LENGTH, HeaderValue::from(size));
        headers.insert(X_MS_BLOB_SEQUENCE_NUMBER, HeaderValue::from_static("0"));
        self.send(
            Method::PUT,
            &encode_path(container, blob),
            &[],
            headers,
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// Upload a VHD into a page blob of `container`, returning the blob url.
    ///
    /// Ranges are written by a fixed pool of workers. The first failure stops
    /// the upload and is returned, the partial page blob is left in place.
    /// Dropping the future aborts the workers.
    pub async fn upload_page_blob(&self, container: &str, upload: &VhdUpload) -> Result<String> {
        let size = tokio::fs::metadata(&upload.path).await?.len();
        if size % PAGE_SIZE != 0 {
            return Err(Error::invalid_argument(format!(
                "{} is {size} bytes, not a multiple of {PAGE_SIZE}",
                upload.path.display()
            )));
        }
        if let Some(r) = upload.skip.iter().find(|r| !r.is_aligned() || r.end >= size) {
            return Err(Error::invalid_argument(format!(
                "skip range {}-{} is not aligned to {PAGE_SIZE} bytes inside the file",
                r.start, r.end
            )));
        }
        let blob = upload.blob_name()?;

        let ranges = chunk_ranges(size, &upload.skip);
        let pending: u64 = ranges.iter().map(PageRange::size).sum();
        let ranges = non_empty_ranges(&upload.path, ranges).await?;
        let uploadable: u64 = ranges.iter().map(PageRange::size).sum();
        let skipped = size - pending;
        info!(
            "uploading {} to {container}/{blob}: {} ranges, {uploadable} of {size} bytes",
            upload.path.display(),
            ranges.len()
        );

        self.create_page_blob(container, &blob, size).await?;

        let progress = Arc::new(Progress {
            processed: AtomicU64::new(skipped),
            total: uploadable + skipped,
            report: upload.progress.clone(),
        });
        self.write_ranges(container, &blob, &upload.path, ranges, upload.workers, progress)
            .await?;

        Ok(self.blob_url(container, &blob))
    }

    async fn write_ranges(
        &self,
        container: &str,
        blob: &str,
        path: &Path,
        ranges: Vec<PageRange>,
        workers: usize,
        progress: Arc<Progress>,
    ) -> Result<()> {
        let (tx, rx) = mpsc::channel(workers);
        let queue: PageQueue = Arc::new(Mutex::new(rx));

        let mut set = JoinSet::new();
        for _ in 0..workers {
            let client = self.clone();
            let queue = queue.clone();
            let progress = progress.clone();
            let container = container.to_string();
            let blob = blob.to_string();
            set.spawn(async move {
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some((range, data)) = next else {
                        return Ok(());
                    };
                    debug!("writing page range {}-{} of {blob}", range.start, range.end);
                    client.put_page(&container, &blob, range, data).await?;
                    progress.add(range.size());
                }
            });
        }

        let mut failure = None;
        let mut file = File::open(path).await?;
        'produce: for range in ranges {
            let data = match read_range(&mut file, range).await {
                Ok(data) => Bytes::from(data),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            };
            let mut item = Some((range, data));
            while let Some(next) = item.take() {
                tokio::select! {
                    permit = tx.reserve() => match permit {
                        Ok(permit) => permit.send(next),
                        Err(_) => break 'produce,
                    },
                    Some(joined) = set.join_next() => {
                        if let Err(err) = join_result(joined) {
                            failure = Some(err);
                            break 'produce;
                        }
                        item = Some(next);
                    }
                }
            }
        }
        drop(tx);

        if failure.is_some() {
            set.abort_all();
        }
        while let Some(joined) = set.join_next().await {
            if let Err(err) = join_result(joined) {
                if failure.is_none() {
                    set.abort_all();
                    failure = Some(err);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
