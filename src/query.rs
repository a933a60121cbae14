//! Forum query strings and batch-cursor arithmetic.
//!
//! Everything the upstream forum understands is expressed as a query string
//! relayed verbatim through the proxy. Page 1 of a forum is addressed by the
//! bare forum query; deeper pages append fixed view flags plus a `batch`
//! offset counted in posts.

/// How many posts the forum lists per batch. This is the upstream's own page
/// granularity and the step between consecutive batch cursors.
pub const POSTS_PER_BATCH: u32 = 30;

/// View flags appended to every batched listing request.
const FORUM_VIEW_FLAGS: &str = "&node=0&areaID=1&old=yes";

/// The base query addressing one forum's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumQuery {
    forum_id: String,
}

impl ForumQuery {
    /// Builds the query for a forum identifier.
    pub fn new(forum_id: &str) -> ForumQuery {
        ForumQuery {
            forum_id: forum_id.to_string(),
        }
    }

    /// Returns the forum identifier this query addresses.
    pub fn forum_id(&self) -> &str {
        &self.forum_id
    }

    /// Returns the bare listing query, which addresses page 1.
    pub fn listing(&self) -> String {
        format!("?act=DF&forumID={}", self.forum_id)
    }

    /// Returns the listing query for a page beyond the first.
    ///
    /// `cursor` is the batch number resolved from the forum's own pager and
    /// `page` the 1-based UI page; callers route `page == 1` through
    /// [`ForumQuery::listing`] instead.
    pub fn paged(&self, cursor: u32, page: u32) -> String {
        let batch = batch_for_page(cursor, page);
        if batch < 0 {
            log::debug!("batch cursor underflowed to {batch}; sending as-is");
        }
        format!("{}{FORUM_VIEW_FLAGS}&batch={batch}", self.listing())
    }
}

/// Maps a UI page number to the forum-native batch cursor.
///
/// Page 2 is the resolved cursor itself; every further page steps one batch
/// of [`POSTS_PER_BATCH`] older. The value is not clamped: a small cursor and
/// a deep page can produce a negative batch, which the upstream tolerates.
fn batch_for_page(cursor: u32, page: u32) -> i64 {
    i64::from(cursor) - (i64::from(page) - 2) * i64::from(POSTS_PER_BATCH)
}
