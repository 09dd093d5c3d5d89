//! Upload + streaming-analysis web server.
//!
//! `POST /upload` stores a CSV and returns an opaque `file_id`;
//! `GET /ws/analyze/{file_id}` runs the `leadflow` CLI as a subprocess,
//! streams its stdout/stderr lines over the socket, and finishes with a
//! structured `COMPLETED` message carrying the uploaded artifact's link.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Multipart, Path, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use docstore_client::DocstoreClient;
use leadflow_common::Config;

/// Store folder collecting every processed output table.
const PROCESSED_FOLDER: &str = "LeadFlow_Processed_Files";

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

struct AppState {
    docs: DocstoreClient,
    uploads_dir: PathBuf,
    /// Path of the CLI binary spawned per analysis.
    cli_bin: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("leadflow=info".parse()?))
        .init();

    let config = Config::web_from_env();

    let uploads_dir = std::env::var("LEADFLOW_UPLOADS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("uploads"));
    std::fs::create_dir_all(&uploads_dir)?;

    let state = Arc::new(AppState {
        docs: DocstoreClient::new(config.google_api_token.clone()),
        uploads_dir,
        cli_bin: std::env::var("LEADFLOW_BIN").unwrap_or_else(|_| "leadflow".to_string()),
    });

    let app = Router::new()
        .route("/upload", post(upload))
        .route("/ws/analyze/{file_id}", get(ws_analyze))
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("LeadFlow server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Store an uploaded file and return an opaque id for later analysis.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(file_name) = field.file_name().map(sanitize_file_name) else {
            continue;
        };
        let Ok(bytes) = field.bytes().await else {
            return error_json("Upload failed: could not read file body");
        };

        // Collision-free on-disk name; the original name is kept for display.
        let stored = format!("{}_{file_name}", uuid::Uuid::new_v4());
        let path = state.uploads_dir.join(stored);
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            return error_json(&format!("Upload failed: {e}"));
        }

        let file_id = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(path.to_string_lossy().as_bytes());
        return Json(serde_json::json!({
            "status": "success",
            "file_id": file_id,
            "filename": file_name,
        }));
    }
    error_json("No file provided")
}

fn error_json(message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "error", "detail": message }))
}

fn sanitize_file_name(name: &str) -> String {
    std::path::Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string())
}

async fn ws_analyze(
    ws: WebSocketUpgrade,
    Path(file_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_analysis(socket, file_id, state))
}

async fn handle_analysis(socket: WebSocket, file_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let input_path = match decode_file_id(&file_id) {
        Some(path) if path.exists() => path,
        _ => {
            let _ = send_text(&mut sender, "Error: File not found or expired.").await;
            let _ = sender.close().await;
            return;
        }
    };

    if send_text(&mut sender, "Starting analysis process...").await.is_err() {
        return;
    }

    let outcome = stream_subprocess(&mut sender, &mut receiver, &state, &input_path).await;

    match outcome {
        Ok(Some(output_path)) => {
            let _ = send_text(&mut sender, "Analysis complete.").await;
            let _ = send_text(&mut sender, "Uploading processed file to Drive...").await;

            let file_name = output_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "processed.csv".to_string());
            match state
                .docs
                .upload_file(&output_path, &file_name, PROCESSED_FOLDER, true)
                .await
            {
                Ok(link) => {
                    let message = serde_json::json!({
                        "type": "COMPLETED",
                        "drive_link": link,
                        "filename": file_name,
                    });
                    let _ = send_text(&mut sender, &message.to_string()).await;
                }
                Err(e) => {
                    error!(error = %e, "Artifact upload failed");
                    let _ = send_text(&mut sender, "Error: Failed to upload to Drive.").await;
                }
            }
            remove_quietly(&output_path).await;
        }
        Ok(None) => {
            let _ = send_text(&mut sender, "Error: Processed file not found.").await;
        }
        Err(e) => {
            let _ = send_text(&mut sender, &format!("Error: {e}")).await;
        }
    }

    remove_quietly(&input_path).await;
    let _ = sender.close().await;
}

/// Run the CLI, forwarding its output lines to the socket. Returns the
/// produced output path on success, `None` when no marker was seen. A
/// client disconnect kills the subprocess.
async fn stream_subprocess(
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
    state: &AppState,
    input_path: &std::path::Path,
) -> Result<Option<PathBuf>> {
    let mut child = Command::new(&state.cli_bin)
        .arg(input_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to start analysis process: {e}"))?;

    let (tx, mut rx) = mpsc::channel::<String>(64);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx.clone()));
    }
    drop(tx);

    let mut output_path = None;
    loop {
        tokio::select! {
            line = rx.recv() => {
                match line {
                    Some(line) => {
                        if let Some(path) = line.strip_prefix("OUTPUT_FILE:") {
                            output_path = Some(PathBuf::from(path.trim()));
                        } else if !line.trim().is_empty()
                            && send_text(sender, &line).await.is_err()
                        {
                            info!("Client disconnected, terminating analysis");
                            let _ = child.kill().await;
                            anyhow::bail!("client disconnected");
                        }
                    }
                    None => break,
                }
            }
            msg = receiver.next() => {
                if matches!(msg, None | Some(Err(_)) | Some(Ok(Message::Close(_)))) {
                    info!("Client disconnected, terminating analysis");
                    let _ = child.kill().await;
                    anyhow::bail!("client disconnected");
                }
            }
        }
    }

    let status = child.wait().await?;
    if !status.success() {
        anyhow::bail!("Process exited with code {}", status.code().unwrap_or(-1));
    }
    Ok(output_path.filter(|p| p.exists()))
}

async fn forward_lines(stream: impl AsyncRead + Unpin, tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

fn decode_file_id(file_id: &str) -> Option<PathBuf> {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(file_id)
        .ok()?;
    Some(PathBuf::from(String::from_utf8(bytes).ok()?))
}

async fn send_text(sender: &mut WsSender, text: &str) -> Result<()> {
    sender
        .send(Message::Text(text.to_string().into()))
        .await
        .map_err(|e| anyhow::anyhow!("socket send failed: {e}"))
}

async fn remove_quietly(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Cleanup failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_round_trips() {
        let path = "/tmp/uploads/abc_leads.csv";
        let id = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(path);
        assert_eq!(decode_file_id(&id), Some(PathBuf::from(path)));
        assert_eq!(decode_file_id("not base64!!"), None);
    }

    #[test]
    fn upload_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("leads.csv"), "leads.csv");
    }
}
