use super::service::AppService;
use crate::dispatcher::Dispatcher;
use crate::error::BindError;
use crate::router::RouteTable;
use may::coroutine::JoinHandle;
use may_minihttp::HttpServer;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// A running listener. Dropping the handle leaves the server running.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts connections, for up to ~250 ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        let probe = if self.addr.ip().is_unspecified() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.addr.port())
        } else {
            self.addr
        };
        for _ in 0..50 {
            if TcpStream::connect(probe).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to finish.
    pub fn stop(self) {
        // SAFETY: cancelling the listener coroutine only unwinds the accept loop; no state
        // outside the coroutine depends on it completing.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let cancelled = self.handle.join().is_err();
        info!(addr = %self.addr, cancelled, "HTTP server stopped");
    }

    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

/// Listen on `0.0.0.0:port`.
///
/// Returning `Ok` is the startup success signal; a bind failure is returned, never retried.
pub fn start(
    table: Arc<RouteTable>,
    dispatcher: Arc<Dispatcher>,
    port: u16,
) -> Result<ServerHandle, BindError> {
    start_on(
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        table,
        dispatcher,
    )
}

/// Listen on an explicit address.
pub fn start_on(
    addr: SocketAddr,
    table: Arc<RouteTable>,
    dispatcher: Arc<Dispatcher>,
) -> Result<ServerHandle, BindError> {
    let routes = table.len();
    let service = AppService::new(table, dispatcher);
    match HttpServer(service).start(addr) {
        Ok(handle) => {
            info!(addr = %addr, routes_count = routes, "HTTP server started");
            Ok(ServerHandle { addr, handle })
        }
        Err(e) => {
            let err = BindError::new(addr, e);
            error!(addr = %addr, error = %err, "Could not start HTTP server");
            Err(err)
        }
    }
}
