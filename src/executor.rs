use crate::error::{CodecError, SplitError};
use crate::pdf::DocumentCodec;
use crate::session::{Session, SplitInfo};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedSession = Arc<Mutex<Session>>;

/// Split the current selection of `session` into a new document.
///
/// The session lock is only held to start and to finish the split; the page copy runs on the
/// blocking pool, so other session events are handled meanwhile. A second call made while one
/// is still running fails with [`SplitError::InFlight`].
///
/// The split runs in its own task, so it finishes and clears the in-flight state even when the
/// caller stops waiting for it.
pub async fn add_split(
    session: &SharedSession,
    codec: Arc<dyn DocumentCodec>,
) -> Result<SplitInfo, SplitError> {
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let job = session.lock().await.begin_split()?;
        let ticket = job.ticket;

        let outcome = tokio::task::spawn_blocking(move || job.run(codec.as_ref()))
            .await
            .unwrap_or_else(|e| Err(task_failure(e)));

        session.lock().await.finish_split(ticket, outcome)
    })
    .await
    .unwrap_or_else(|e| Err(task_failure(e)))
}

fn task_failure(e: tokio::task::JoinError) -> SplitError {
    SplitError::CodecFailure(CodecError::Serialize(format!("split task failed: {}", e)))
}
