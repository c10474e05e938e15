//! Vault I/O for the life-memory snapshot: content sources, the persisted
//! cache, user configuration, and the bootstrap error boundary.

pub mod bootstrap;
pub mod cache_file;
pub mod clock;
pub mod config;
pub mod error;
pub mod journal;
pub mod source;
pub mod vault;

pub use bootstrap::{BootstrapOptions, BootstrapReport, Bootstrapper};
pub use cache_file::CacheFile;
pub use config::{Config, default_state_dir};
pub use error::{Result, SourceError, StoreError};
pub use journal::{AppendTarget, EventRecord, append_event};
pub use source::{CommandSource, ContentSource, FileSource, acquire_daily, load_governance};
pub use vault::{Vault, resolve_vault_root};
