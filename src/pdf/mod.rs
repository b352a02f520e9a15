pub mod codec;
pub mod document;
#[cfg(test)]
pub mod fixtures;

pub use codec::{DocumentCodec, LopdfCodec};
pub use document::{PdfDocument, PdfInfo};
