use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::download::{download_all, download_split, DirectorySink};
use crate::executor::{add_split, SharedSession};
use crate::pdf::{DocumentCodec, LopdfCodec};
use crate::session::{Session, SplitId};
use crate::upload::Upload;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PageTextRequest {
    #[schemars(description = "Text typed into the page field; need not be a valid number yet")]
    pub value: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PageRequest {
    #[schemars(description = "Page number (1-indexed)")]
    pub page: u32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SplitIdRequest {
    #[schemars(description = "Split id as reported in the session status")]
    pub id: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DownloadSplitRequest {
    #[schemars(description = "Split id as reported in the session status")]
    pub id: u64,
    #[schemars(description = "Directory to save the split into")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OutputDirRequest {
    #[schemars(description = "Directory to save the splits into")]
    pub output_dir: String,
}

#[derive(Clone)]
pub struct SplitServer {
    session: SharedSession,
    codec: Arc<dyn DocumentCodec>,
    download_delay: Duration,
    tool_router: ToolRouter<Self>,
}

impl SplitServer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            codec: Arc::new(LopdfCodec),
            download_delay: settings.download_delay,
            tool_router: Self::tool_router(),
        }
    }

    async fn status(&self) -> String {
        let status = self.session.lock().await.status();
        serde_json::to_string_pretty(&status).unwrap_or_else(|e| format!("Error: {}", e))
    }
}

#[tool_router]
impl SplitServer {
    #[tool(description = "Load a PDF into the session, replacing the current document and discarding its splits. Selects all pages.")]
    async fn load_document(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let upload = match Upload::from_path(&path) {
            Ok(u) => u,
            Err(e) => return format!("Error: {}", e),
        };
        let loaded = self
            .session
            .lock()
            .await
            .load_upload(self.codec.as_ref(), upload);
        match loaded {
            Ok(_) => self.status().await,
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Type into the 'from page' field. Raising it above the 'to page' raises both.")]
    async fn set_from_page(&self, Parameters(req): Parameters<PageTextRequest>) -> String {
        // Rejected input is reported through `input_error` in the status.
        let _ = self
            .session
            .lock()
            .await
            .controller_mut()
            .input_from(&req.value);
        self.status().await
    }

    #[tool(description = "Type into the 'to page' field. Values below the 'from page' are rejected.")]
    async fn set_to_page(&self, Parameters(req): Parameters<PageTextRequest>) -> String {
        let _ = self
            .session
            .lock()
            .await
            .controller_mut()
            .input_to(&req.value);
        self.status().await
    }

    #[tool(description = "Drag the 'from page' slider. The value is clamped to the document's pages.")]
    async fn slide_from_page(&self, Parameters(PageRequest { page }): Parameters<PageRequest>) -> String {
        self.session.lock().await.controller_mut().slide_from(page);
        self.status().await
    }

    #[tool(description = "Drag the 'to page' slider. The value is clamped between the 'from page' and the last page.")]
    async fn slide_to_page(&self, Parameters(PageRequest { page }): Parameters<PageRequest>) -> String {
        self.session.lock().await.controller_mut().slide_to(page);
        self.status().await
    }

    #[tool(description = "Leave the 'from page' field; invalid text reverts to the selected page")]
    async fn blur_from_page(&self) -> String {
        self.session.lock().await.controller_mut().blur_from();
        self.status().await
    }

    #[tool(description = "Leave the 'to page' field; invalid text reverts to the selected page")]
    async fn blur_to_page(&self) -> String {
        self.session.lock().await.controller_mut().blur_to();
        self.status().await
    }

    #[tool(description = "Move the preview to the next page")]
    async fn preview_next_page(&self) -> String {
        self.session.lock().await.controller_mut().next_preview_page();
        self.status().await
    }

    #[tool(description = "Move the preview to the previous page")]
    async fn preview_prev_page(&self) -> String {
        self.session.lock().await.controller_mut().prev_preview_page();
        self.status().await
    }

    #[tool(description = "Extract the selected page range into a new split document")]
    async fn add_split(&self) -> String {
        match add_split(&self.session, Arc::clone(&self.codec)).await {
            Ok(_) => self.status().await,
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Remove a split by id")]
    async fn remove_split(&self, Parameters(SplitIdRequest { id }): Parameters<SplitIdRequest>) -> String {
        self.session.lock().await.remove_split(SplitId(id));
        self.status().await
    }

    #[tool(description = "Save one split as split_<from>-<to>_<name> in a directory")]
    async fn download_split(&self, Parameters(req): Parameters<DownloadSplitRequest>) -> String {
        let sink = DirectorySink::new(PathBuf::from(req.output_dir));
        match download_split(&self.session, &sink, SplitId(req.id)).await {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Save every split, in creation order, into a directory")]
    async fn download_all(&self, Parameters(req): Parameters<OutputDirRequest>) -> String {
        let sink = DirectorySink::new(PathBuf::from(req.output_dir));
        let report = download_all(&self.session, &sink, self.download_delay).await;

        let mut lines: Vec<String> = report
            .saved
            .iter()
            .map(|p| format!("Saved {}", p.display()))
            .collect();
        lines.extend(
            report
                .failed
                .iter()
                .map(|(id, e)| format!("Error: split {}: {}", id, e)),
        );
        if lines.is_empty() {
            return "No splits to download.".to_string();
        }
        lines.join("\n")
    }

    #[tool(description = "Close the document and discard every split")]
    async fn reset_session(&self) -> String {
        self.session.lock().await.reset();
        self.status().await
    }

    #[tool(description = "Get the session state: document, selection, field texts, errors and splits")]
    async fn session_status(&self) -> String {
        self.status().await
    }
}

#[tool_handler]
impl ServerHandler for SplitServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF split session. Use load_document to open a PDF, set_from_page/set_to_page \
                 or the slide_* tools to choose a page range, add_split to extract it, and \
                 download_split/download_all to save the results. session_status shows the \
                 current state."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(settings: &Settings) -> Result<()> {
    let server = SplitServer::new(settings);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
