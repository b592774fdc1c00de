//! Loopback HTTP server for the static web bundle.
//!
//! Every request is answered from the bundle root. Paths that match no file
//! get the bundle's `index.html` with status 200 so client-side routing can
//! take over. A directory without its own index is redirected (307) to the
//! slash-terminated path first, then answered with the bundle index.
//!
//! The server runs on its own thread with its own tokio runtime, apart from
//! the window's event loop on the main thread. [`spawn`] returns only once
//! the listener is bound (or binding failed), so a port conflict surfaces
//! before any window exists.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::{ServerConfig, INDEX_DOCUMENT};
use crate::error::ServerError;

/// Build the static router for `root`.
pub fn router(root: &Path) -> Router {
    let index = ServeFile::new(root.join(INDEX_DOCUMENT));
    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(index);

    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn(log_request))
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let res = next.run(req).await;
    debug!("[server] {method} {path} -> {}", res.status().as_u16());
    res
}

/// A bound, not yet serving, Local Server.
pub struct LocalServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl LocalServer {
    /// Bind `config.host:config.port`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is taken or cannot be
    /// bound on this host.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            router: router(&config.root_dir),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept and serve connections until the process ends.
    pub async fn serve(self) -> Result<(), ServerError> {
        info!("[server] listening on http://{}", self.local_addr);
        axum::serve(self.listener, self.router)
            .await
            .map_err(ServerError::Serve)
    }
}

/// Handle to the server thread started by [`spawn`].
pub struct ServerHandle {
    addr: SocketAddr,
    thread: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the serve loop has already returned.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Terminate the process with status 1 if the serve loop ever returns.
    ///
    /// A window without its server has nothing to show, so a late failure is
    /// as fatal as a startup one.
    pub fn exit_on_failure(self) {
        let watch = thread::Builder::new()
            .name("local-server-watch".into())
            .spawn(move || {
                match self.thread.join() {
                    Ok(Ok(())) => error!("[server] serve loop returned unexpectedly"),
                    Ok(Err(e)) => error!("[server] {e}"),
                    Err(_) => error!("[server] server thread panicked"),
                }
                std::process::exit(1);
            });
        if let Err(e) = watch {
            warn!("[server] cannot watch server thread: {e}");
        }
    }
}

/// Start the Local Server on a dedicated thread.
///
/// Blocks until the listener is bound.
///
/// # Errors
///
/// Returns the bind or runtime error if the server could not start.
pub fn spawn(config: &ServerConfig) -> Result<ServerHandle, ServerError> {
    let (bound_tx, bound_rx) = mpsc::sync_channel::<SocketAddr>(1);
    let config = config.clone();

    let thread = thread::Builder::new()
        .name("local-server".into())
        .spawn(move || -> Result<(), ServerError> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("local-server-worker")
                .enable_all()
                .build()
                .map_err(ServerError::Runtime)?;

            runtime.block_on(async move {
                let server = LocalServer::bind(&config).await?;
                // The receiver only disappears if the caller gave up; keep serving.
                let _ = bound_tx.send(server.local_addr());
                server.serve().await
            })
        })
        .map_err(ServerError::Runtime)?;

    match bound_rx.recv() {
        Ok(addr) => Ok(ServerHandle { addr, thread }),
        // Sender dropped without a value: the thread returned early.
        Err(_) => Err(match thread.join() {
            Ok(Err(e)) => e,
            _ => ServerError::Vanished,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn bundle(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("{prefix}_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&root).expect("create bundle");
        fs::write(root.join(INDEX_DOCUMENT), "<!doctype html><title>t</title>").expect("index");
        root
    }

    fn config(root: &Path, port: u16) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            root_dir: root.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn bind_on_port_zero_reports_real_port() {
        let root = bundle("apd_server_bind");
        let server = LocalServer::bind(&config(&root, 0)).await.expect("bind");
        assert_ne!(server.local_addr().port(), 0);
        let _ = fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn bind_fails_when_port_taken() {
        let root = bundle("apd_server_taken");
        let first = LocalServer::bind(&config(&root, 0)).await.expect("first bind");
        let port = first.local_addr().port();

        let err = LocalServer::bind(&config(&root, port))
            .await
            .err()
            .expect("second bind must fail");
        assert!(matches!(err, ServerError::Bind { .. }), "{err}");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn spawn_returns_bind_error_from_thread() {
        let root = bundle("apd_server_spawn_taken");
        let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("occupy port");
        let port = taken.local_addr().expect("addr").port();

        let err = spawn(&config(&root, port)).err().expect("spawn must fail");
        assert!(matches!(err, ServerError::Bind { .. }), "{err}");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn spawn_binds_before_returning() {
        let root = bundle("apd_server_spawn_ok");
        let handle = spawn(&config(&root, 0)).expect("spawn");
        assert!(std::net::TcpStream::connect(handle.addr()).is_ok());
        assert!(!handle.is_finished());
        let _ = fs::remove_dir_all(root);
    }
}
