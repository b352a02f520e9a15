use crate::error::DownloadError;
use crate::executor::SharedSession;
use crate::session::{DownloadRequest, SplitId};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Destination for finished splits.
pub trait DownloadSink: Send + Sync {
    /// Save `bytes` under the suggested `file_name`, returning where they ended up.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError>;
}

/// Saves splits as files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DirectorySink {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        std::fs::create_dir_all(&self.dir).map_err(DownloadError::Failure)?;

        // Only the final component, so a source name can never point outside the directory.
        let file_name = Path::new(file_name)
            .file_name()
            .unwrap_or_else(|| "split.pdf".as_ref());
        let path = self.dir.join(file_name);

        std::fs::write(&path, bytes).map_err(DownloadError::Failure)?;
        Ok(path)
    }
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(SplitId, DownloadError)>,
}

pub async fn download_split(
    session: &SharedSession,
    sink: &dyn DownloadSink,
    id: SplitId,
) -> Result<PathBuf, DownloadError> {
    let request = session.lock().await.download_request(id)?;
    let result = save(sink, &request);
    if let Err(err) = &result {
        session.lock().await.record_download_failure(err);
    }
    result
}

/// Save every split in creation order, waiting `spacing` between requests.
///
/// Every split is attempted even when an earlier save fails.
pub async fn download_all(
    session: &SharedSession,
    sink: &dyn DownloadSink,
    spacing: Duration,
) -> DownloadReport {
    let requests = session.lock().await.download_requests();
    let mut report = DownloadReport::default();

    for (index, request) in requests.iter().enumerate() {
        if index > 0 && !spacing.is_zero() {
            tokio::time::sleep(spacing).await;
        }
        match save(sink, request) {
            Ok(path) => report.saved.push(path),
            Err(err) => {
                session.lock().await.record_download_failure(&err);
                report.failed.push((request.id, err));
            }
        }
    }

    report
}

fn save(sink: &dyn DownloadSink, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
    let path = sink.save(&request.file_name, &request.bytes)?;
    info!("saved split {} to {}", request.id, path.display());
    Ok(path)
}
