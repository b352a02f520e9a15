use super::{PdfDocument, PdfInfo};
use crate::error::CodecError;

/// The PDF library seam: everything the session knows about the binary format goes through here.
pub trait DocumentCodec: Send + Sync {
    /// Parse `bytes` and report the document's metadata, including its page count.
    fn open(&self, bytes: &[u8]) -> Result<PdfInfo, CodecError>;

    /// Serialize a new document containing pages `from_idx..=to_idx` (0-indexed) of `bytes`.
    fn copy_page_range(&self, bytes: &[u8], from_idx: u32, to_idx: u32)
        -> Result<Vec<u8>, CodecError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfCodec;

impl DocumentCodec for LopdfCodec {
    fn open(&self, bytes: &[u8]) -> Result<PdfInfo, CodecError> {
        let doc = PdfDocument::from_bytes(bytes)?;
        if doc.page_count() == 0 {
            return Err(CodecError::Empty);
        }
        Ok(doc.get_info())
    }

    fn copy_page_range(
        &self,
        bytes: &[u8],
        from_idx: u32,
        to_idx: u32,
    ) -> Result<Vec<u8>, CodecError> {
        let doc = PdfDocument::from_bytes(bytes)?;
        let mut new_doc = doc.extract_range(from_idx, to_idx)?;
        PdfDocument::to_bytes(&mut new_doc)
    }
}
