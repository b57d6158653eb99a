//! # login-rs-http
//!
//! Connection layer for the login-rs authentication engine: the
//! [`Connection`] and [`Response`] types handlers see, cookie parsing and
//! formatting, the per-connection [`Session`] store handle, the
//! [`RouteReverser`](router::RouteReverser) contract for named redirect
//! targets, and the [`Middleware`] pipeline the engine plugs into.

pub mod connection;
pub mod cookies;
pub mod middleware;
pub mod response;
pub mod router;
pub mod session;

// Re-exports for convenience
pub use connection::{Connection, ConnectionBuilder, ConnectionKind};
pub use cookies::{parse_cookie_header, Cookie, SameSite};
pub use middleware::{
    socket, view, HandlerFuture, Middleware, MiddlewarePipeline, SocketFuture, SocketHandler,
    ViewHandler,
};
pub use response::Response;
pub use router::{HttpError, RouteReverser, RouteTable};
pub use session::Session;
