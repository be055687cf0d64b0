// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · http v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19
//
// ─────────────────────────────────────────────────────────────
// tagrelay · Control Server
//
// Single-threaded JSON control surface over tiny_http. One loop
// owns the device: it waits for a request no longer than the next
// relay deadline, releases expired pulses, then answers.
//
// # Public API
//   - `ControlServer::bind`
//   - `ControlServer::serve`
//   - `ControlServer::handle_one`
//   - `api::route` (transport-free route table)
// ─────────────────────────────────────────────────────────────

pub mod api;

use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

use crate::device::clock::Rtc;
use crate::device::Device;
use crate::hw::drivers::relay::RelayPin;
use crate::store::ByteStore;
use api::{ApiResponse, Method};

/// Request bodies beyond this are cut off and fail JSON parsing.
pub const MAX_BODY: u64 = 4096;
/// Longest wait for a request while no relay pulse is pending.
pub const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct ControlServer {
    server: Server,
}

impl ControlServer {
    pub fn bind(addr: &str) -> Result<Self, ServerError> {
        let server = Server::http(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;
        info!("http: listening on {}", addr);
        Ok(Self { server })
    }

    /// Bound address; `None` for non-IP listeners.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until `shutdown` is raised.
    pub fn serve<S, P, C>(
        &self,
        device: &mut Device<S, P, C>,
        shutdown: &AtomicBool,
    ) -> Result<(), ServerError>
    where
        S: ByteStore,
        P: RelayPin,
        C: Rtc,
    {
        while !shutdown.load(Ordering::SeqCst) {
            self.handle_one(device)?;
        }
        info!("http: shutting down");
        Ok(())
    }

    /// Release any expired relay pulse, then wait for and answer at most
    /// one request. Returns `true` when a request was answered.
    pub fn handle_one<S, P, C>(&self, device: &mut Device<S, P, C>) -> Result<bool, ServerError>
    where
        S: ByteStore,
        P: RelayPin,
        C: Rtc,
    {
        let now = Instant::now();
        if let Err(e) = device.tick(now) {
            warn!("http: relay release failed: {}", e);
        }
        let wait = device
            .next_deadline()
            .map(|at| at.saturating_duration_since(now).min(IDLE_POLL))
            .unwrap_or(IDLE_POLL);
        match self.server.recv_timeout(wait)? {
            Some(request) => {
                dispatch(device, request);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn dispatch<S, P, C>(device: &mut Device<S, P, C>, mut request: Request)
where
    S: ByteStore,
    P: RelayPin,
    C: Rtc,
{
    let method = match request.method() {
        tiny_http::Method::Get => Method::Get,
        tiny_http::Method::Post => Method::Post,
        _ => Method::Other,
    };
    let url = request.url().to_owned();
    let mut body = String::new();
    let reply = match request
        .as_reader()
        .take(MAX_BODY)
        .read_to_string(&mut body)
    {
        Ok(_) => api::route(device, method, &url, &body, Instant::now()),
        Err(e) => {
            debug!("http: unreadable body on {}: {}", url, e);
            ApiResponse::error(400, "Invalid JSON")
        }
    };
    info!("http: {:?} {} -> {}", method, url, reply.status);
    let mut response =
        Response::from_string(reply.body.to_string()).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!("http: failed to respond on {}: {}", url, e);
    }
}
