//! # Pawsync Client
//!
//! The I/O half of pawsync: persists the offline queue from
//! `pawsync-engine`, replays it against the REST API, and schedules
//! retries.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pawsync_client::{HandlerRegistry, HttpTransport, SqliteStore, SyncService};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteStore::connect("sqlite://pawsync.db").await?);
//! let transport = Arc::new(HttpTransport::new(
//!     "https://api.pawsync.app",
//!     std::time::Duration::from_secs(30),
//! )?);
//!
//! let service = SyncService::builder(store, HandlerRegistry::rest(transport))
//!     .build()
//!     .await?;
//! let handle = service.start();
//!
//! service.create_pet(json!({"name": "Rex", "species": "dog"})).await;
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod events;
pub mod handlers;
pub mod service;
pub mod storage;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use connectivity::{Connectivity, ConnectivityMonitor, HttpProbe};
pub use error::{ClientError, HandlerError, StorageError, TransportError};
pub use events::{EventNotifier, SyncEvent};
pub use handlers::{HandlerRegistry, OperationHandler, RestHandler};
pub use service::{PassReport, SyncHandle, SyncService, SyncServiceBuilder};
pub use storage::{KeyValueStore, MemoryStore, QueueStore, SqliteStore};
pub use transport::{HttpTransport, Method, RemoteRequest, RemoteTransport};
