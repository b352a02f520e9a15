use thiserror::Error;

/// Failures reported by a [`DocumentCodec`](crate::pdf::DocumentCodec).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("PDF has no pages")]
    Empty,

    #[error("page index {index} is out of range (document has {total} pages)")]
    PageOutOfRange { index: u32, total: u32 },

    #[error("failed to serialize PDF: {0}")]
    Serialize(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Please upload a valid PDF file.")]
    UploadRejected { media_type: String },

    #[error("Could not read the PDF file. The file might be corrupted or password-protected.")]
    Unreadable(#[source] CodecError),
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("No PDF file is loaded.")]
    NoDocument,

    #[error("A split is already in progress.")]
    InFlight,

    #[error("{0}")]
    InvalidRange(&'static str),

    #[error("Failed to split the PDF. Please try again with a different file.")]
    CodecFailure(#[source] CodecError),

    #[error("The document changed while the split was running; the result was discarded.")]
    Discarded,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("No split with id {0}")]
    NotFound(u64),

    #[error("Failed to download the split PDF. Please try again.")]
    Failure(#[source] std::io::Error),
}

/// Transient page-number validation errors raised while the user edits a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("From page cannot be less than 1")]
    FromBelowOne,

    #[error("From page cannot exceed total pages")]
    FromExceedsTotal,

    #[error("To page cannot be less than from page")]
    ToBelowFrom,

    #[error("To page cannot exceed total pages")]
    ToExceedsTotal,
}
