//! HTTP debug endpoint implementation.

use crate::OverlaySnapshot;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Debug, thiserror::Error)]
pub enum DebugServerError {
    #[error("failed to bind to port {port}: {error}")]
    BindError { port: u16, error: String },
}

/// HTTP server exposing the LOD overlay snapshot.
/// Runs on a background thread to avoid blocking the frame loop.
pub struct DebugServer {
    port: u16,
    actual_port: Option<u16>,
    handle: Option<JoinHandle<()>>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    frame: u64,
}

impl DebugServer {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            actual_port: None,
            handle: None,
        }
    }

    /// Start serving. The shared snapshot is replaced by the frame loop
    /// after each pass; requests only ever read it.
    pub fn start(&mut self, snapshot: Arc<Mutex<OverlaySnapshot>>) -> Result<(), DebugServerError> {
        let server = Server::http(format!("127.0.0.1:{}", self.port)).map_err(|e| {
            DebugServerError::BindError {
                port: self.port,
                error: e.to_string(),
            }
        })?;

        let actual_port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        self.actual_port = Some(actual_port);

        let handle = thread::spawn(move || {
            Self::run_server(server, snapshot);
        });

        self.handle = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self) {
        // tiny_http doesn't support graceful shutdown, so we just detach the
        // thread; it terminates with the process.
        if let Some(handle) = self.handle.take() {
            std::mem::forget(handle);
        }
    }

    pub fn actual_port(&self) -> u16 {
        self.actual_port.unwrap_or(self.port)
    }

    fn run_server(server: Server, snapshot: Arc<Mutex<OverlaySnapshot>>) {
        for request in server.incoming_requests() {
            if let Err(e) = Self::handle_request(request, &snapshot) {
                eprintln!("debug server error: {}", e);
            }
        }
    }

    fn handle_request(
        request: Request,
        snapshot: &Arc<Mutex<OverlaySnapshot>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let json_header =
            || Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();

        let response = match (request.method(), request.url()) {
            (&Method::Get, "/health") => {
                let snapshot = snapshot.lock().unwrap();
                let response = HealthResponse {
                    status: "ok".to_string(),
                    frame: snapshot.frame,
                };
                Response::from_string(serde_json::to_string(&response)?).with_header(json_header())
            }
            (&Method::Get, "/lod") => {
                let snapshot = snapshot.lock().unwrap();
                Response::from_string(serde_json::to_string(&*snapshot)?).with_header(json_header())
            }
            _ => Response::from_string("Not Found").with_status_code(404),
        };

        request.respond(response)?;
        Ok(())
    }
}

impl Drop for DebugServer {
    fn drop(&mut self) {
        self.stop();
    }
}
