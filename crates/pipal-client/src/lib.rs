//! pipal-client: course-server integration.
//!
//! Talks to the course server over HTTP, stores credentials and sync state
//! under the state directory, and loads the `pipal.toml` configuration.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod sync;

pub use api::{PipalClient, Update, User};
pub use config::{load_config, load_config_from, PipalConfig};
pub use credentials::Credentials;
pub use error::ClientError;
pub use sync::{apply_updates, SyncEvent, SyncState};
