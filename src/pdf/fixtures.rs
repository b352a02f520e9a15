//! In-memory PDFs for tests. Page `n` (1-indexed) has a MediaBox width of `100 + n`, so the
//! order of pages in an output document can be read back with [`page_widths`].

use lopdf::{Dictionary, Document, Object, StringFormat};

pub fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    save(build_test_document(num_pages))
}

/// A test PDF whose trailer declares standard-handler encryption.
pub fn create_encrypted_test_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = build_test_document(num_pages);
    let encrypt = Dictionary::from_iter(vec![
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(1)),
        ("R", Object::Integer(2)),
        ("O", Object::String(vec![0x28; 32], StringFormat::Hexadecimal)),
        ("U", Object::String(vec![0x4E; 32], StringFormat::Hexadecimal)),
        ("P", Object::Integer(-4)),
    ]);
    let encrypt_id = doc.add_object(encrypt);
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    let file_id = Object::String(vec![0x01; 16], StringFormat::Hexadecimal);
    doc.trailer
        .set("ID", Object::Array(vec![file_id.clone(), file_id]));
    save(doc)
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn build_test_document(num_pages: u32) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for n in 1..=num_pages {
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(100 + n as i64),
                    Object::Integer(792),
                ]),
            ),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let info = Dictionary::from_iter(vec![(
        "Title",
        Object::String(b"Fixture".to_vec(), StringFormat::Literal),
    )]);
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));
    doc
}

/// MediaBox widths of every page, in page order.
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut pages: Vec<_> = doc.get_pages().into_iter().collect();
    pages.sort_by_key(|(num, _)| *num);
    pages
        .into_iter()
        .map(|(_, id)| {
            let page = doc.get_dictionary(id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_i64().unwrap()
        })
        .collect()
}
