//! The split session: one loaded document, its page-range selection and the splits derived
//! from it.

use crate::error::{DownloadError, LoadError, SplitError};
use crate::handle::{ByteHandle, HandleStore};
use crate::pdf::{DocumentCodec, PdfInfo};
use crate::selection::{Selection, SelectionController};
use crate::upload::Upload;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SplitId(pub u64);

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct LoadedDocument {
    pub name: String,
    pub page_count: u32,
    pub info: PdfInfo,
    bytes: Arc<[u8]>,
    preview: ByteHandle,
}

/// An extracted page range. Immutable once created.
#[derive(Debug)]
pub struct Split {
    pub id: SplitId,
    pub from_page: u32,
    pub to_page: u32,
    pub page_count: u32,
    artifact: ByteHandle,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitInfo {
    pub id: SplitId,
    pub from_page: u32,
    pub to_page: u32,
    pub page_count: u32,
}

impl From<&Split> for SplitInfo {
    fn from(split: &Split) -> Self {
        SplitInfo {
            id: split.id,
            from_page: split.from_page,
            to_page: split.to_page,
            page_count: split.page_count,
        }
    }
}

/// Identifies one in-flight split and the document it was started against.
#[derive(Debug, Clone, Copy)]
pub struct SplitTicket {
    job: u64,
    generation: u64,
    pub selection: Selection,
}

/// Work captured by [`Session::begin_split`]; runs without access to the session.
#[derive(Debug)]
pub struct SplitJob {
    pub ticket: SplitTicket,
    source: Arc<[u8]>,
}

impl SplitJob {
    pub fn run(&self, codec: &dyn DocumentCodec) -> Result<Vec<u8>, SplitError> {
        let Selection { from_page, to_page } = self.ticket.selection;
        codec
            .copy_page_range(&self.source, from_page - 1, to_page - 1)
            .map_err(SplitError::CodecFailure)
    }
}

/// A pending save request for one split.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub id: SplitId,
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub source_name: Option<String>,
    pub title: Option<String>,
    pub page_count: u32,
    pub selection: Selection,
    pub from_text: String,
    pub to_text: String,
    pub input_error: Option<String>,
    pub error: Option<String>,
    pub preview_page: u32,
    pub preview: String,
    pub split_in_flight: bool,
    pub can_split: bool,
    pub splits: Vec<SplitInfo>,
}

#[derive(Debug, Default)]
pub struct Session {
    document: Option<LoadedDocument>,
    selection: SelectionController,
    splits: Vec<Split>,
    handles: HandleStore,
    last_error: Option<String>,
    generation: u64,
    next_job: u64,
    next_split_id: u64,
    in_flight: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a user-supplied file. A rejected upload leaves the current document untouched.
    pub fn load_upload(
        &mut self,
        codec: &dyn DocumentCodec,
        upload: Upload,
    ) -> Result<u32, LoadError> {
        self.last_error = None;
        if let Err(err) = upload.accept() {
            if let LoadError::UploadRejected { media_type } = &err {
                info!("rejected upload {} ({})", upload.name, media_type);
            }
            return Err(self.record(err));
        }
        self.load_document(codec, upload.name, upload.bytes)
    }

    /// Replace the session's document. The previous document and its splits are released
    /// first, so a failed load leaves the session empty.
    pub fn load_document(
        &mut self,
        codec: &dyn DocumentCodec,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<u32, LoadError> {
        self.reset();
        let name = name.into();

        let info = match codec.open(&bytes) {
            Ok(info) => info,
            Err(e) => return Err(self.record(LoadError::Unreadable(e))),
        };

        let bytes: Arc<[u8]> = Arc::from(bytes);
        let preview = self.handles.register(Arc::clone(&bytes));
        let page_count = info.page_count;
        self.selection.reset_for(page_count);
        info!("loaded {} ({} pages)", name, page_count);

        self.document = Some(LoadedDocument {
            name,
            page_count,
            info,
            bytes,
            preview,
        });
        Ok(page_count)
    }

    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, |d| d.page_count)
    }

    pub fn selection(&self) -> Selection {
        self.selection.selection()
    }

    pub fn controller_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    #[cfg(test)]
    pub fn handles(&self) -> &HandleStore {
        &self.handles
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_split_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the "add split" action should be offered right now.
    pub fn can_split(&self) -> bool {
        self.document.is_some() && self.in_flight.is_none()
    }

    /// Validate the committed selection and capture everything the split needs.
    pub fn begin_split(&mut self) -> Result<SplitJob, SplitError> {
        if self.in_flight.is_some() {
            return Err(SplitError::InFlight);
        }
        self.last_error = None;

        let (source, page_count) = match &self.document {
            Some(document) => (Arc::clone(&document.bytes), document.page_count),
            None => return Err(self.record(SplitError::NoDocument)),
        };

        let selection = self.selection.selection();
        if let Err(err) = check_range(selection, page_count) {
            return Err(self.record(err));
        }

        self.next_job += 1;
        self.in_flight = Some(self.next_job);
        Ok(SplitJob {
            ticket: SplitTicket {
                job: self.next_job,
                generation: self.generation,
                selection,
            },
            source,
        })
    }

    /// Append the split produced for `ticket`, or record why it failed. The split list only
    /// changes when the whole document was produced.
    pub fn finish_split(
        &mut self,
        ticket: SplitTicket,
        outcome: Result<Vec<u8>, SplitError>,
    ) -> Result<SplitInfo, SplitError> {
        if self.in_flight == Some(ticket.job) {
            self.in_flight = None;
        }
        if ticket.generation != self.generation {
            info!("discarding split for a document that is no longer loaded");
            return Err(SplitError::Discarded);
        }

        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.record(err)),
        };

        let Selection { from_page, to_page } = ticket.selection;
        self.next_split_id += 1;
        let split = Split {
            id: SplitId(self.next_split_id),
            from_page,
            to_page,
            page_count: ticket.selection.page_count(),
            artifact: self.handles.register(Arc::from(bytes)),
        };
        info!(
            "created split {} (pages {}-{}, {} pages)",
            split.id, from_page, to_page, split.page_count
        );

        let split_info = SplitInfo::from(&split);
        self.splits.push(split);
        Ok(split_info)
    }

    /// Remove the split with `id`, if present.
    pub fn remove_split(&mut self, id: SplitId) -> bool {
        let Some(pos) = self.splits.iter().position(|s| s.id == id) else {
            return false;
        };
        let split = self.splits.remove(pos);
        self.handles.release(split.artifact);
        info!("removed split {}", id);
        true
    }

    pub fn download_name(&self, split: &Split) -> String {
        let source = self.document.as_ref().map_or("document.pdf", |d| d.name.as_str());
        format!("split_{}-{}_{}", split.from_page, split.to_page, source)
    }

    pub fn download_request(&mut self, id: SplitId) -> Result<DownloadRequest, DownloadError> {
        self.last_error = None;
        let request = self
            .splits
            .iter()
            .find(|s| s.id == id)
            .and_then(|split| self.request_for(split));
        match request {
            Some(request) => Ok(request),
            None => Err(self.record(DownloadError::NotFound(id.0))),
        }
    }

    /// Save requests for every split, in creation order.
    pub fn download_requests(&mut self) -> Vec<DownloadRequest> {
        self.last_error = None;
        self.splits
            .iter()
            .filter_map(|split| self.request_for(split))
            .collect()
    }

    /// Surface a failure reported by the download sink.
    pub fn record_download_failure(&mut self, err: &DownloadError) {
        warn!("{}", err);
        self.last_error = Some(err.to_string());
    }

    /// Release the document and every split, and return to the empty state.
    pub fn reset(&mut self) {
        self.release_all();
        self.selection.clear();
        self.last_error = None;
        self.in_flight = None;
        self.generation += 1;
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            source_name: self.document.as_ref().map(|d| d.name.clone()),
            title: self.document.as_ref().and_then(|d| d.info.title.clone()),
            page_count: self.page_count(),
            selection: self.selection(),
            from_text: self.selection.from_text().to_string(),
            to_text: self.selection.to_text().to_string(),
            input_error: self.selection.input_error().map(|e| e.to_string()),
            error: self.last_error().map(str::to_string),
            preview_page: self.selection.preview_page(),
            preview: self.selection.preview_target(),
            split_in_flight: self.is_split_in_flight(),
            can_split: self.can_split(),
            splits: self.splits().iter().map(SplitInfo::from).collect(),
        }
    }

    fn request_for(&self, split: &Split) -> Option<DownloadRequest> {
        Some(DownloadRequest {
            id: split.id,
            file_name: self.download_name(split),
            bytes: self.handles.bytes(&split.artifact)?,
        })
    }

    fn record<E: fmt::Display>(&mut self, err: E) -> E {
        warn!("{}", err);
        self.last_error = Some(err.to_string());
        err
    }

    fn release_all(&mut self) {
        if let Some(document) = self.document.take() {
            self.handles.release(document.preview);
            info!("closed {}", document.name);
        }
        for split in self.splits.drain(..) {
            self.handles.release(split.artifact);
        }
        debug_assert_eq!(self.handles.live_count(), 0);
    }
}

/// Re-check the selection invariant right before splitting.
fn check_range(selection: Selection, page_count: u32) -> Result<(), SplitError> {
    if selection.from_page > selection.to_page {
        return Err(SplitError::InvalidRange(
            "From page cannot be greater than to page",
        ));
    }
    if selection.from_page < 1 || selection.to_page > page_count {
        return Err(SplitError::InvalidRange("Page range is invalid"));
    }
    Ok(())
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release_all();
        debug!(
            "session closed, {} handles released",
            self.handles.released_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::pdf::fixtures::{create_encrypted_test_pdf, create_test_pdf, page_widths};
    use crate::pdf::LopdfCodec;
    use crate::upload::PDF_MEDIA_TYPE;

    /// Opens anything, fails every page copy.
    struct BrokenCopyCodec;

    impl DocumentCodec for BrokenCopyCodec {
        fn open(&self, _bytes: &[u8]) -> Result<PdfInfo, CodecError> {
            Ok(PdfInfo {
                page_count: 4,
                ..Default::default()
            })
        }

        fn copy_page_range(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<u8>, CodecError> {
            Err(CodecError::Serialize("disk full".into()))
        }
    }

    /// Reports whatever page count it is given, including none.
    struct PageCountCodec(u32);

    impl DocumentCodec for PageCountCodec {
        fn open(&self, _bytes: &[u8]) -> Result<PdfInfo, CodecError> {
            Ok(PdfInfo {
                page_count: self.0,
                ..Default::default()
            })
        }

        fn copy_page_range(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
    }

    fn loaded(pages: u32) -> Session {
        let mut session = Session::new();
        session
            .load_document(&LopdfCodec, "book.pdf", create_test_pdf(pages))
            .unwrap();
        session
    }

    fn split_now(session: &mut Session) -> Result<SplitInfo, SplitError> {
        let job = session.begin_split()?;
        let outcome = job.run(&LopdfCodec);
        session.finish_split(job.ticket, outcome)
    }

    fn range(session: &Session) -> (u32, u32) {
        let s = session.selection();
        (s.from_page, s.to_page)
    }

    #[test]
    fn test_load_selects_whole_document() {
        let session = loaded(10);
        assert_eq!(session.page_count(), 10);
        assert_eq!(range(&session), (1, 10));
        assert_eq!(session.handles().live_count(), 1);
        assert_eq!(session.status().title.as_deref(), Some("Fixture"));
    }

    #[test]
    fn test_split_scenario() {
        let mut session = loaded(10);
        session.controller_mut().input_from("5").unwrap();
        assert_eq!(range(&session), (5, 10));

        assert!(session.controller_mut().input_to("3").is_err());
        assert!(session.status().input_error.is_some());
        assert_eq!(range(&session), (5, 10));

        let split = split_now(&mut session).unwrap();
        assert_eq!((split.from_page, split.to_page, split.page_count), (5, 10, 6));
        assert_eq!(session.splits().len(), 1);

        let request = session.download_request(split.id).unwrap();
        assert_eq!(request.file_name, "split_5-10_book.pdf");
        assert_eq!(page_widths(&request.bytes), vec![105, 106, 107, 108, 109, 110]);

        assert!(session.remove_split(split.id));
        assert!(session.splits().is_empty());
        assert_eq!(session.handles().live_count(), 1);
    }

    #[test]
    fn test_splits_append_in_creation_order_with_unique_ids() {
        let mut session = loaded(6);
        session.controller_mut().input_to("2").unwrap();
        let first = split_now(&mut session).unwrap();
        session.controller_mut().slide_from(4);
        session.controller_mut().slide_to(6);
        let second = split_now(&mut session).unwrap();

        assert_ne!(first.id, second.id);
        let order: Vec<_> = session.splits().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![first.id, second.id]);
    }

    #[test]
    fn test_remove_unknown_split_is_noop() {
        let mut session = loaded(3);
        split_now(&mut session).unwrap();
        assert!(!session.remove_split(SplitId(999)));
        assert_eq!(session.splits().len(), 1);
    }

    #[test]
    fn test_reset_releases_everything() {
        let mut session = loaded(4);
        split_now(&mut session).unwrap();
        split_now(&mut session).unwrap();
        assert_eq!(session.handles().live_count(), 3);

        session.reset();
        assert_eq!(session.page_count(), 0);
        assert_eq!(range(&session), (1, 1));
        assert!(session.splits().is_empty());
        assert!(session.status().source_name.is_none());
        assert_eq!(session.handles().live_count(), 0);
        assert_eq!(session.handles().released_count(), 3);
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn test_failed_load_leaves_session_empty() {
        let mut session = loaded(5);
        split_now(&mut session).unwrap();

        let err = session
            .load_document(&LopdfCodec, "broken.pdf", b"garbage".to_vec())
            .unwrap_err();
        assert!(matches!(err, LoadError::Unreadable(_)));
        assert!(session.status().source_name.is_none());
        assert_eq!(session.page_count(), 0);
        assert_eq!(range(&session), (1, 1));
        assert_eq!(session.handles().live_count(), 0);
        assert!(session.last_error().is_some());
    }

    #[test]
    fn test_encrypted_document_is_unreadable() {
        let mut session = Session::new();
        let err = session
            .load_document(&LopdfCodec, "locked.pdf", create_encrypted_test_pdf(3))
            .unwrap_err();
        assert!(matches!(err, LoadError::Unreadable(_)));
        assert_eq!(session.page_count(), 0);
        assert_eq!(
            session.last_error(),
            Some("Could not read the PDF file. The file might be corrupted or password-protected.")
        );
    }

    #[test]
    fn test_rejected_upload_keeps_current_document() {
        let mut session = loaded(5);
        let upload = Upload::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = session.load_upload(&LopdfCodec, upload).unwrap_err();
        assert!(matches!(err, LoadError::UploadRejected { .. }));
        assert_eq!(session.page_count(), 5);
        assert_eq!(session.last_error(), Some("Please upload a valid PDF file."));
    }

    #[test]
    fn test_new_load_replaces_document_and_splits() {
        let mut session = loaded(5);
        split_now(&mut session).unwrap();

        let upload = Upload::new("other.pdf", PDF_MEDIA_TYPE, create_test_pdf(3));
        assert_eq!(session.load_upload(&LopdfCodec, upload).unwrap(), 3);
        assert!(session.splits().is_empty());
        assert_eq!(range(&session), (1, 3));
        assert_eq!(session.handles().live_count(), 1);
        assert_eq!(session.handles().released_count(), 2);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let reversed = Selection {
            from_page: 4,
            to_page: 2,
        };
        let err = check_range(reversed, 10).unwrap_err();
        assert!(matches!(err, SplitError::InvalidRange(_)));
        assert_eq!(err.to_string(), "From page cannot be greater than to page");

        for bad in [(0, 3), (2, 11)] {
            let selection = Selection {
                from_page: bad.0,
                to_page: bad.1,
            };
            let err = check_range(selection, 10).unwrap_err();
            assert_eq!(err.to_string(), "Page range is invalid");
        }
        assert!(check_range(Selection { from_page: 1, to_page: 10 }, 10).is_ok());

        // a document reporting no pages leaves the default {1, 1} selection out of range
        let mut session = Session::new();
        session
            .load_document(&PageCountCodec(0), "empty.pdf", vec![])
            .unwrap();
        let err = session.begin_split().unwrap_err();
        assert!(matches!(err, SplitError::InvalidRange("Page range is invalid")));
        assert!(!session.is_split_in_flight());
        assert!(session.splits().is_empty());
        assert_eq!(session.last_error(), Some("Page range is invalid"));
    }

    #[test]
    fn test_split_requires_document() {
        let mut session = Session::new();
        assert!(matches!(session.begin_split(), Err(SplitError::NoDocument)));
        assert!(!session.can_split());
    }

    #[test]
    fn test_second_split_is_blocked_while_in_flight() {
        let mut session = loaded(3);
        let job = session.begin_split().unwrap();
        assert!(session.is_split_in_flight());
        assert!(!session.can_split());
        assert!(matches!(session.begin_split(), Err(SplitError::InFlight)));

        let outcome = job.run(&LopdfCodec);
        session.finish_split(job.ticket, outcome).unwrap();
        assert!(session.can_split());
    }

    #[test]
    fn test_codec_failure_appends_nothing() {
        let mut session = Session::new();
        session
            .load_document(&BrokenCopyCodec, "x.pdf", vec![1, 2, 3])
            .unwrap();
        let job = session.begin_split().unwrap();
        let outcome = job.run(&BrokenCopyCodec);
        let err = session.finish_split(job.ticket, outcome).unwrap_err();

        assert!(matches!(err, SplitError::CodecFailure(_)));
        assert!(session.splits().is_empty());
        assert_eq!(session.handles().live_count(), 1);
        assert!(!session.is_split_in_flight());
        assert!(session.last_error().is_some());

        // the next attempt clears the previous operation error
        session.begin_split().unwrap();
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn test_split_finishing_after_reset_is_discarded() {
        let mut session = loaded(3);
        let job = session.begin_split().unwrap();
        let outcome = job.run(&LopdfCodec);

        session.reset();
        session
            .load_document(&LopdfCodec, "next.pdf", create_test_pdf(2))
            .unwrap();

        let err = session.finish_split(job.ticket, outcome).unwrap_err();
        assert!(matches!(err, SplitError::Discarded));
        assert!(session.splits().is_empty());
        assert_eq!(session.handles().live_count(), 1);
    }

    #[test]
    fn test_ids_stay_unique_across_reset() {
        let mut session = loaded(2);
        let first = split_now(&mut session).unwrap();
        session.reset();
        session
            .load_document(&LopdfCodec, "book.pdf", create_test_pdf(2))
            .unwrap();
        let second = split_now(&mut session).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_download_unknown_split() {
        let mut session = loaded(2);
        assert!(matches!(
            session.download_request(SplitId(7)),
            Err(DownloadError::NotFound(7))
        ));
    }
}
