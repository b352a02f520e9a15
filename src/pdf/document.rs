use crate::error::CodecError;
use lopdf::{Document, Object, ObjectId};

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let doc = Document::load_mem(bytes).map_err(|e| CodecError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(CodecError::Encrypted);
        }
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.mod_date = get_string_from_dict(dict, b"ModDate");
                info.subject = get_string_from_dict(dict, b"Subject");
                info.keywords = get_string_from_dict(dict, b"Keywords");
            }
        }

        info.page_count = self.page_count();
        info
    }

    /// Build a new document holding pages `from_idx..=to_idx` (0-indexed) in source order.
    pub fn extract_range(&self, from_idx: u32, to_idx: u32) -> Result<Document, CodecError> {
        let all_pages = self.page_ids();
        let total = all_pages.len() as u32;

        for index in [from_idx, to_idx] {
            if index >= total {
                return Err(CodecError::PageOutOfRange { index, total });
            }
        }

        let keep = (from_idx + 1)..=(to_idx + 1);
        let pages_to_delete: Vec<u32> = all_pages
            .iter()
            .map(|(num, _)| *num)
            .filter(|num| !keep.contains(num))
            .collect();

        let mut new_doc = self.doc.clone();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
        }
        new_doc.prune_objects();

        Ok(new_doc)
    }

    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| CodecError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16 BE with BOM, otherwise treat as PDFDocEncoding (approximated by Latin-1)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
