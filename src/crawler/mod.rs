//! Fetching side of the pipeline
//!
//! This module implements the host allowlist, the resilient HTTP fetcher
//! with its shared cookie session, and the orchestrator that turns a site
//! URL into a list of articles.

pub mod allowlist;
pub mod fetcher;
pub mod headers;
pub mod orchestrator;
pub mod session;

pub use allowlist::{HostAllowlist, MatchMode};
pub use fetcher::{Fetcher, RenderProxy};
pub use orchestrator::{ArticleSource, NewsScraper};
pub use session::{CookieStore, SessionState};
