use crate::pdf::{DocumentCodec, LopdfCodec};
use crate::upload::Upload;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let upload = Upload::from_path(&path)?;
    upload.accept()?;
    let info = LopdfCodec
        .open(&upload.bytes)
        .with_context(|| format!("Failed to open PDF: {}", path.as_ref().display()))?;

    println!("File: {}", path.as_ref().display());
    println!("Pages: {}", info.page_count);

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(keywords) = &info.keywords {
        println!("Keywords: {}", keywords);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    Ok(())
}

/// Render a PDF date (`D:YYYYMMDDHHmmSS...`) as `YYYY-MM-DD HH:mm:SS`.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    let Some(day) = d.get(0..8).filter(|s| s.bytes().all(|b| b.is_ascii_digit())) else {
        return date.to_string();
    };

    let time = match d.get(8..14) {
        Some(t) if t.bytes().all(|b| b.is_ascii_digit()) => {
            format!(" {}:{}:{}", &t[0..2], &t[2..4], &t[4..6])
        }
        _ => String::new(),
    };
    format!("{}-{}-{}{}", &day[0..4], &day[4..6], &day[6..8], time)
}
