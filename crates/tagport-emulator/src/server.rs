//! HTTP front end of an emulated reader service.
//!
//! Serves the reader-service contract on one port:
//!
//! | Route                    | Method | Body            |
//! |--------------------------|--------|-----------------|
//! | `/api/v1/Discover`       | POST   | `{"Key": ..}`   |
//! | `/api/v1/GetDevices`     | GET    |                 |
//! | `/api/v1/SetDevice`      | POST   | `{"ComPort": ..}` |
//! | `/api/v1/TestDevice`     | POST   | `{"ComPort": ..}` |
//! | `/api/v1/read`           | GET    |                 |
//!
//! Control failures are reported in the body (`Success: false`) with a 200
//! status, like the real service. A wrong discovery key gets a 401.

use crate::error::{EmulatorError, Result};
use crate::state::{EmulatorState, Outcome};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tagport_core::constants::*;
use tagport_network::wire::{DeviceRecord, TagRecord};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type SharedState = Arc<Mutex<EmulatorState>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyBody {
    #[serde(default)]
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ComPortBody {
    #[serde(default)]
    com_port: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Reply<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> Reply<T> {
    fn from_outcome(outcome: Outcome<T>, message: &str) -> Json<Self> {
        Json(match outcome {
            Ok(data) => Self {
                success: true,
                message: Some(message.to_string()),
                data: Some(data),
            },
            Err(reason) => Self {
                success: false,
                message: Some(reason),
                data: None,
            },
        })
    }
}

fn lock(state: &SharedState) -> MutexGuard<'_, EmulatorState> {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    guard.record_request();
    guard
}

async fn discover(State(state): State<SharedState>, Json(body): Json<KeyBody>) -> Response {
    if !lock(&state).key_matches(&body.key) {
        warn!("Discovery with wrong key");
        let reply: Reply<()> = Reply {
            success: false,
            message: Some("Invalid key".to_string()),
            data: None,
        };
        return (StatusCode::UNAUTHORIZED, Json(reply)).into_response();
    }

    let reply: Reply<()> = Reply {
        success: true,
        message: Some(DISCOVERY_ACK_V1.to_string()),
        data: None,
    };
    Json(reply).into_response()
}

async fn get_devices(State(state): State<SharedState>) -> Json<Reply<Vec<DeviceRecord>>> {
    let devices = lock(&state).devices().to_vec();
    Json(Reply {
        success: true,
        message: None,
        data: Some(devices),
    })
}

async fn set_device(
    State(state): State<SharedState>,
    Json(body): Json<ComPortBody>,
) -> Json<Reply<DeviceRecord>> {
    let outcome = lock(&state).select(&body.com_port);
    debug!(com_port = %body.com_port, ok = outcome.is_ok(), "SetDevice");
    Reply::from_outcome(outcome, "Device selected")
}

async fn test_device(
    State(state): State<SharedState>,
    Json(body): Json<ComPortBody>,
) -> Json<Reply<()>> {
    let outcome = lock(&state).test(&body.com_port);
    Reply::from_outcome(outcome, "Device OK")
}

async fn read(State(state): State<SharedState>) -> Json<Reply<Vec<TagRecord>>> {
    let outcome = lock(&state).read();
    Reply::from_outcome(outcome, "Read completed")
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route(PATH_DISCOVER, post(discover))
        .route(PATH_GET_DEVICES, get(get_devices))
        .route(PATH_SET_DEVICE, post(set_device))
        .route(PATH_TEST_DEVICE, post(test_device))
        .route(PATH_READ, get(read))
        .with_state(state)
}

/// A reader service emulator, not yet listening.
pub struct EmulatorServer {
    state: SharedState,
}

impl EmulatorServer {
    pub fn new(state: EmulatorState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Bind `addr` and serve in a background task.
    ///
    /// Port 0 picks a free port; see [`EmulatorHandle::addr`].
    pub async fn start(self, addr: SocketAddr) -> Result<EmulatorHandle> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| EmulatorError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<EmulatorHandle> {
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(self.state.clone());

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = served {
                warn!(%addr, error = %e, "Emulator stopped with error");
            }
        });

        info!(%addr, "Reader service emulator listening");
        Ok(EmulatorHandle {
            addr,
            state: self.state,
            shutdown: Some(shutdown_tx),
            task,
        })
    }
}

/// Running emulator. Script it through [`EmulatorHandle::with_state`].
pub struct EmulatorHandle {
    addr: SocketAddr,
    state: SharedState,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl EmulatorHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Run `f` against the live state.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut EmulatorState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Stop accepting connections and wait for the server task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        (&mut self.task).await.ok();
        info!(addr = %self.addr, "Reader service emulator stopped");
    }
}

impl Drop for EmulatorHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
    }
}
