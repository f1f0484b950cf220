//! Serve command - run the HTTP API.

use super::{build_services, load_config};
use crate::server::{self, state::AppState};
use anyhow::{Context, Result};
use colored::Colorize;
use tokio::runtime::Runtime;

pub fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    if !vox_process::all_tools_available() {
        println!(
            "{} ffmpeg or whisper is missing; audio and video uploads will fail. Run 'vox check'.",
            "Warning:".yellow()
        );
    }

    let addr = config.server.address();
    let max_upload_size = config.server.max_upload_size;

    let rt = Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(async {
        let (pipeline, answers) = build_services(&config)?;
        let state = AppState::new(pipeline, answers, &config);

        println!(
            "{} http://{} (embedding model {}, answer model {})",
            "Serving".green().bold(),
            addr,
            config.ollama.embedding_model,
            config.ollama.model
        );

        server::serve(state, &addr, max_upload_size)
            .await
            .with_context(|| format!("Server on {} failed", addr))
    })
}
