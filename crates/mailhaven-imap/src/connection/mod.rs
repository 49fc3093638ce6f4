//! Connection management: transport, framing, typestate session, IDLE.

mod config;
mod framed;
mod idle;
mod proxy;
mod session;
mod stream;

pub use config::{ConnectConfig, ConnectConfigBuilder, Encryption, Proxy};
pub use framed::{FramedStream, ResponseAccumulator};
pub use idle::{IdleEvent, IdleHandle};
pub use session::{AuthState, Authenticated, FetchRows, NotAuthenticated, Selected, Session};
pub use stream::{BoxedIo, ImapStream, from_io, open, tls_connector};
