//! # foliocounter - Visitor counter for the Folio server
//!
//! A single integer, shared by every server instance, lives in an external
//! key/value store. A marker cookie makes sure a browser is counted at most
//! once per 24 hours.
//!
//! ```no_run
//! use foliocounter::{CounterStore, UpstashStore};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let store = UpstashStore::new("https://example.upstash.io", "token", Duration::from_secs(10))?;
//! let count = store.incr("portfolio_visitors").await?;
//! println!("visitor #{}", count);
//! # Ok::<(), foliocounter::CounterError>(())
//! # });
//! ```

pub mod config_ext;
pub mod error;
pub mod server_ext;
pub mod store;

pub use config_ext::CounterConfigExt;
pub use error::{CounterError, Result};
pub use server_ext::{
    VisitorCount, VisitorState, VisitorsApiDoc, VisitorsServerExt, create_api_router,
};
pub use store::{CounterStore, UpstashStore};
