//! Provider connection lifecycle
//!
//! `ConnectionPool` owns every provider connection opened at startup and
//! closes them in reverse order when the session ends, however it ends.

mod pool;

pub use pool::{AcquireReport, ConnectedProvider, ConnectionPool, FailedProvider};
