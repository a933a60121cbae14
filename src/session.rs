//! Session state and the command surface for driving page loads.
//!
//! A [`Session`] owns everything one browsing session needs: the proxied
//! [`Client`], the selected forum with its resolved cursor and pager, and
//! the most recently finalized [`Gallery`]. Commands return a
//! [`PageRequest`] describing the page to load; the caller hands it back to
//! [`Session::load`] to run the pipeline. Each command supersedes the ones
//! before it, and a load whose request is no longer current is discarded
//! without touching the network.

use crate::client::Client;
use crate::error::Error;
use crate::gallery::Gallery;
use crate::listing::{self, Listing};
use crate::pager::Pager;
use crate::progress::{self, LoadPhase, ProgressReceiver, ProgressSender};
use crate::query::ForumQuery;
use crate::result::Result;

/// Everything tied to the currently selected forum. Replaced wholesale when
/// the selection changes, so the cursor and pager can never outlive the
/// query they were derived from.
#[derive(Debug)]
struct ForumState {
    query: ForumQuery,
    cursor: Option<u32>,
    pager: Pager,
}

/// One navigable page, resolved to the query string that addresses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    query: String,
    page: u32,
    generation: u64,
}

impl PageRequest {
    /// Returns the query string the proxy should resolve.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the 1-based page number the request addresses.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the session generation the request was minted under.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A browsing session over one forum at a time.
#[derive(Debug)]
pub struct Session {
    client: Client,
    forum: Option<ForumState>,
    gallery: Option<Gallery>,
    progress: Option<ProgressSender>,
    generation: u64,
}

impl Session {
    /// Creates a session that fetches through the given client.
    pub fn new(client: Client) -> Session {
        Session {
            client,
            forum: None,
            gallery: None,
            progress: None,
            generation: 0,
        }
    }

    /// Subscribes to the session's progress events.
    ///
    /// Events describe the phases of every subsequent [`Session::load`];
    /// see [`LoadPhase`] for the status copy and progress fraction.
    pub fn subscribe(&mut self) -> ProgressReceiver {
        self.progress
            .get_or_insert_with(|| progress::channel().0)
            .subscribe()
    }

    /// Switches the session to a forum and requests its first page.
    ///
    /// The forum query, cursor and pager are replaced in one step and any
    /// previously loaded gallery is dropped. The returned request addresses
    /// page one, which the forum serves without a cursor.
    pub fn select_forum(&mut self, forum_id: &str) -> PageRequest {
        let query = ForumQuery::new(forum_id);
        let listing = query.listing();
        log::info!("forum {forum_id} selected");

        self.forum = Some(ForumState {
            cursor: None,
            pager: Pager::new(),
            query,
        });
        self.gallery = None;
        self.generation += 1;

        PageRequest {
            query: listing,
            page: 1,
            generation: self.generation,
        }
    }

    /// Requests a page of the selected forum by its 1-based number.
    ///
    /// Page 0 is rejected, there is nothing newer than page 1. Page 1 maps
    /// to the bare forum query. Deeper pages are addressed through the
    /// resolved cursor; until page 1 has been loaded and the cursor with
    /// it, they are rejected as well. A successful call repositions the
    /// pager, renumbering its window when the move crosses a boundary.
    pub fn navigate(&mut self, page: u32) -> Option<PageRequest> {
        if page == 0 {
            log::debug!("ignoring navigation to page 0, nothing newer than page 1");
            return None;
        }
        let Some(state) = self.forum.as_mut() else {
            log::warn!("navigation with no forum selected");
            return None;
        };

        let query = if page == 1 {
            state.query.listing()
        } else {
            let Some(cursor) = state.cursor else {
                log::warn!("page {page} needs a pagination cursor and none is resolved yet");
                return None;
            };
            state.query.paged(cursor, page)
        };
        state.pager.go_to(page);

        self.generation += 1;
        Some(PageRequest {
            query,
            page,
            generation: self.generation,
        })
    }

    /// Requests the page before the current one. Rejected on page 1.
    pub fn newer(&mut self) -> Option<PageRequest> {
        let current = self.forum.as_ref()?.pager.current();
        self.navigate(current.saturating_sub(1))
    }

    /// Requests the page after the current one.
    pub fn older(&mut self) -> Option<PageRequest> {
        let current = self.forum.as_ref()?.pager.current();
        self.navigate(current + 1)
    }

    /// Runs the pipeline for a requested page and stores the outcome.
    ///
    /// A request minted before a later command is stale and yields
    /// `Ok(None)` without a fetch. Otherwise the listing page is fetched
    /// through the proxy, the cursor is resolved and cached if the session
    /// lacks one, and every image-marked post is fetched and aggregated
    /// into the finalized gallery. A batch without image posts finalizes to
    /// an empty gallery.
    ///
    /// # Errors
    ///
    /// Returns the fetch or cursor error that aborted the load. Listing
    /// failures are fatal to the whole page; per-post failures are not and
    /// surface as placeholders instead. The user-facing description is
    /// also emitted as a [`LoadPhase::Failed`] event.
    pub async fn load(&mut self, request: PageRequest) -> Result<Option<&Gallery>> {
        let PageRequest {
            query,
            page,
            generation,
        } = request;
        if generation != self.generation {
            log::info!("discarding a stale load for page {page}");
            return Ok(None);
        }

        progress::emit(self.progress.as_ref(), generation, LoadPhase::Querying);

        let reply = match self.client.fetch(&query).await {
            Ok(reply) => reply,
            Err(error) => return Err(self.fail(page, generation, error)),
        };
        let listing_html = match reply.into_body() {
            Ok(body) => body,
            Err(error) => return Err(self.fail(page, generation, error)),
        };

        if self.cursor_unresolved() {
            match listing::resolve_cursor(&listing_html) {
                Ok(value) => {
                    log::info!("pagination cursor resolved to {value}");
                    if let Some(state) = self.forum.as_mut() {
                        state.cursor = Some(value);
                    }
                }
                Err(error) => return Err(self.fail(page, generation, error)),
            }
        }

        let posts = Listing::parse(&listing_html);
        if posts.is_empty() {
            log::info!("page {page} holds no image posts");
            progress::emit(self.progress.as_ref(), generation, LoadPhase::Empty);
            return Ok(Some(self.gallery.insert(Gallery::default())));
        }

        progress::emit(
            self.progress.as_ref(),
            generation,
            LoadPhase::Filtering { posts: posts.len() },
        );

        let gallery = Gallery::load(
            &self.client,
            posts.into_posts(),
            self.progress.as_ref(),
            generation,
        )
        .await;

        progress::emit(
            self.progress.as_ref(),
            generation,
            LoadPhase::Done {
                posts: gallery.len(),
            },
        );
        Ok(Some(self.gallery.insert(gallery)))
    }

    /// Switches the displayed image of a post in the loaded gallery.
    ///
    /// Returns `false` when no gallery is loaded, the post is unknown, or
    /// the post holds no such image.
    pub fn select_thumbnail(&mut self, post_id: &str, image_url: &str) -> bool {
        self.gallery
            .as_mut()
            .is_some_and(|gallery| gallery.select_thumbnail(post_id, image_url))
    }

    /// Returns the most recently finalized gallery, if any.
    pub fn gallery(&self) -> Option<&Gallery> {
        self.gallery.as_ref()
    }

    /// Returns the selected forum's query, if a forum is selected.
    pub fn forum(&self) -> Option<&ForumQuery> {
        self.forum.as_ref().map(|state| &state.query)
    }

    /// Returns the pager for the selected forum.
    pub fn pager(&self) -> Option<&Pager> {
        self.forum.as_ref().map(|state| &state.pager)
    }

    /// Returns the resolved pagination cursor, once page 1 has loaded.
    pub fn cursor(&self) -> Option<u32> {
        self.forum.as_ref().and_then(|state| state.cursor)
    }

    fn cursor_unresolved(&self) -> bool {
        self.forum.as_ref().is_some_and(|state| state.cursor.is_none())
    }

    /// Emits the user-facing failure for an aborted load and hands the
    /// error back for propagation.
    fn fail(&self, page: u32, generation: u64, error: Error) -> Error {
        let message = match &error {
            Error::CursorMissing | Error::CursorValue(_) => String::from(
                "Sorry, there was a problem loading the forum pages. Try another forum.",
            ),
            other => format!("Oops! There was an error with the proxy page. Details: {other}"),
        };
        log::warn!("page {page} load failed: {error}");
        progress::emit(
            self.progress.as_ref(),
            generation,
            LoadPhase::Failed { message },
        );
        error
    }
}
