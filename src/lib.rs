#![deny(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]
#![allow(clippy::must_use_candidate)]
//! # clpics
//!
//! clpics rebuilds an image-first browsing experience over craigslist's
//! forum listings, scraped through a small caching proxy.
//!
//! A [`Session`] can:
//! - fetch listing pages and resolve the forum's own pagination cursor,
//! - collect the image-marked posts and fan out their detail fetches,
//! - aggregate the results into a sorted, row-partitioned [`Gallery`],
//! - translate pager clicks into forum-native batch queries.
//!
//! While guaranteeing:
//! - every post a listing promised appears in the gallery exactly once,
//!   as an image or as a placeholder.
//! - network timing never changes the finalized order.
//! - a load superseded by a newer command is discarded, not rendered.
//!
//! ## Example: printing a forum's first page of image posts.
//!
//! ```no_run
//! # type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
//! use clpics::{Client, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new("http://localhost:8080/proxy.php")?;
//!     let mut session = Session::new(client);
//!
//!     let request = session.select_forum("3");
//!     if let Some(gallery) = session.load(request).await? {
//!         if let Some(range) = gallery.date_range() {
//!             println!("{range}");
//!         }
//!         for post in gallery.posts() {
//!             println!("{post}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`Session`]: crate::session::Session
//! [`Gallery`]: crate::gallery::Gallery

/// Client module contains the [`Fetch`] trait and the proxied [`Client`]
/// implementing it.
pub mod client;

/// Contains [`Error`]s that can be thrown by the library.
///
/// [`Error`]: crate::error::Error
pub mod error;

pub mod gallery;

pub mod listing;

pub mod pager;

pub mod post;

pub mod progress;

pub mod query;

pub(crate) mod result;

pub mod session;

pub use client::{Client, Fetch, Reply};
pub use error::Error;
pub use gallery::{DateRange, Gallery};
pub use listing::{Listing, PostRef};
pub use pager::Pager;
pub use post::{Post, PostMedia};
pub use progress::{LoadEvent, LoadPhase, ProgressReceiver, ProgressSender};
pub use query::ForumQuery;
pub use session::{PageRequest, Session};
