use super::request::parse_request;
use super::response::{write_dispatch_error, write_handler_response};
use crate::dispatcher::Dispatcher;
use crate::router::RouteTable;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;

/// `may_minihttp` service: parse the request, dispatch it, write the response.
///
/// Holds no routing state of its own; the table and dispatcher are shared read-only.
#[derive(Clone)]
pub struct AppService {
    pub table: Arc<RouteTable>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(table: Arc<RouteTable>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { table, dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let incoming = match parse_request(req, self.dispatcher.body_limit()) {
            Ok(r) => r,
            Err(e) => {
                write_dispatch_error(res, &self.dispatcher.reject(e));
                return Ok(());
            }
        };
        match self.dispatcher.dispatch(&self.table, incoming) {
            Ok(resp) => write_handler_response(res, resp),
            Err(e) => write_dispatch_error(res, &e),
        }
        Ok(())
    }
}
