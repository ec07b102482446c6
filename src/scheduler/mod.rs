//! Periodic background work
//!
//! # Modules
//!
//! - [`refresher`] - Keeps the snapshot cache warm for the configured sites
//!
//! # Quick Start
//!
//! ```ignore
//! use manchete::scheduler::CacheRefresher;
//! use tokio_util::sync::CancellationToken;
//!
//! let refresher = Arc::new(CacheRefresher::new(scraper, cache, &config.refresh));
//! let cancel = CancellationToken::new();
//! let handle = Arc::clone(&refresher).spawn(cancel.clone());
//!
//! // ... on shutdown
//! cancel.cancel();
//! handle.await?;
//! ```

pub mod refresher;

pub use refresher::{CacheRefresher, CycleReport, RefreshState};
