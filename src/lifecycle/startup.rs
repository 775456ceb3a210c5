//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a route table into a Dispatcher
//! - Bind the listener when `server.listen` is set
//! - Start the HTTP server task
//!
//! # Design Decisions
//! - Fail fast: bind errors are fatal and returned
//! - Listener binds last (traffic only once the table is built)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::RpcConfig;
use crate::dispatch::Dispatcher;
use crate::http::{RpcServer, MANIFEST_PATH};
use crate::lifecycle::Shutdown;
use crate::routing::{Method, RouteTable};

#[derive(Debug, Error)]
pub enum StartupError {
    /// A route would be shadowed by the exposed manifest endpoint.
    #[error("{method} {path} is reserved for the route manifest")]
    ReservedPath { method: Method, path: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of [`launch`].
pub enum Launched {
    /// Server task running on `addr`.
    Listening {
        addr: SocketAddr,
        dispatcher: Dispatcher,
        task: JoinHandle<Result<(), std::io::Error>>,
    },
    /// `listen = false`: nothing bound, dispatch in-process.
    InProcess { dispatcher: Dispatcher },
}

impl Launched {
    pub fn dispatcher(&self) -> &Dispatcher {
        match self {
            Launched::Listening { dispatcher, .. } | Launched::InProcess { dispatcher } => {
                dispatcher
            }
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Launched::Listening { addr, .. } => Some(*addr),
            Launched::InProcess { .. } => None,
        }
    }
}

/// Build the dispatcher and, when configured to listen, start serving.
pub async fn launch(
    config: RpcConfig,
    table: RouteTable,
    shutdown: &Shutdown,
) -> Result<Launched, StartupError> {
    if config.server.expose_manifest {
        for method in [Method::Get, Method::Head] {
            if let Some((route, _)) = table.find(method, MANIFEST_PATH) {
                return Err(StartupError::ReservedPath {
                    method,
                    path: route.pattern.as_str().to_string(),
                });
            }
        }
    }

    tracing::info!(routes = table.len(), listen = config.server.listen, "Route table built");
    let dispatcher = Dispatcher::new(table);

    if !config.server.listen {
        return Ok(Launched::InProcess { dispatcher });
    }

    let address = config.server.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    let addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address,
        source,
    })?;

    tracing::info!(address = %addr, "Listening for connections");

    let server = RpcServer::new(config, dispatcher.clone());
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Ok(Launched::Listening {
        addr,
        dispatcher,
        task,
    })
}
