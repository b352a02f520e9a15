use crate::config::Settings;
use crate::download::{download_all, DirectorySink};
use crate::executor::{add_split, SharedSession};
use crate::page_range::parse_page_ranges;
use crate::pdf::{DocumentCodec, LopdfCodec};
use crate::session::Session;
use crate::upload::Upload;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    ranges: &str,
    output_dir: Q,
    settings: &Settings,
) -> Result<()> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    let ranges = parse_page_ranges(ranges)?;

    let codec: Arc<dyn DocumentCodec> = Arc::new(LopdfCodec);
    let session: SharedSession = Arc::new(Mutex::new(Session::new()));

    let upload = Upload::from_path(input)?;
    let total_pages = session
        .lock()
        .await
        .load_upload(codec.as_ref(), upload)
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;

    for range in &ranges {
        let (from, to) = range.resolve(total_pages);
        select(&session, from, to)
            .await
            .with_context(|| format!("Invalid page range {}-{}", from, to))?;

        let split = add_split(&session, Arc::clone(&codec)).await?;
        println!(
            "Split {}: pages {} to {} ({} page{})",
            split.id,
            split.from_page,
            split.to_page,
            split.page_count,
            if split.page_count == 1 { "" } else { "s" }
        );
    }

    let sink = DirectorySink::new(output_dir);
    let report = download_all(&session, &sink, settings.download_delay).await;
    for path in &report.saved {
        println!("Saved {}", path.display());
    }
    if let Some((id, err)) = report.failed.into_iter().next() {
        return Err(err).with_context(|| format!("Failed to save split {}", id));
    }

    println!(
        "Split {} into {} file(s) in {}",
        input.display(),
        report.saved.len(),
        output_dir.display()
    );

    Ok(())
}

/// Enter a range the way a user would: type the from page, then the to page.
async fn select(session: &SharedSession, from: u32, to: u32) -> Result<()> {
    let mut guard = session.lock().await;
    let controller = guard.controller_mut();
    controller.input_from(&from.to_string())?;
    controller.input_to(&to.to_string())?;
    Ok(())
}
