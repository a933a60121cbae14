//! Fan-out aggregation of one page's posts into a render-ready gallery.
//!
//! Every post reference a listing promised is fetched concurrently and lands
//! in the gallery exactly once, as an enriched [`Post`] or as a placeholder.
//! Nothing is finalized until the last fetch reports back, so the gallery's
//! order depends only on the post ids, never on network timing.

use std::fmt::{self, Display, Formatter};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};

use crate::client::Fetch;
use crate::listing::PostRef;
use crate::post::{Post, PostMedia};
use crate::progress::{self, LoadPhase, ProgressSender};

/// Posts per gallery row.
const ROW_WIDTH: usize = 4;

/// The display dates bracketing a gallery page.
///
/// Posts sort newest first, so the range runs from the first post's date to
/// the last one's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    newest: String,
    oldest: String,
}

impl DateRange {
    /// Returns the date of the newest post on the page.
    pub fn newest(&self) -> &str {
        &self.newest
    }

    /// Returns the date of the oldest post on the page.
    pub fn oldest(&self) -> &str {
        &self.oldest
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.newest, self.oldest)
    }
}

/// A finalized page of image posts, partitioned into rows for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gallery {
    rows: Vec<Vec<Post>>,
    date_range: Option<DateRange>,
}

impl Gallery {
    /// Fetches every referenced post through `fetcher` and aggregates the
    /// results.
    ///
    /// Detail pages resolve concurrently; each completion fills the slot
    /// assigned to it at dispatch time and bumps a `Loading` progress event.
    /// A post whose fetch or parse fails stays in the page as a placeholder.
    /// Once all slots are filled, posts are sorted descending by id and cut
    /// into rows of four.
    pub(crate) async fn load<F>(
        fetcher: &F,
        refs: Vec<PostRef>,
        progress: Option<&ProgressSender>,
        generation: u64,
    ) -> Gallery
    where
        F: Fetch + Sync,
    {
        let total = refs.len();
        let mut slots: Vec<Option<Post>> = vec![None; total];
        let mut pending: FuturesUnordered<_> = refs
            .into_iter()
            .enumerate()
            .map(|(slot, source)| fetch_one(fetcher, slot, source))
            .collect();

        let mut completed = 0;
        while let Some((slot, post)) = pending.next().await {
            slots[slot] = Some(post);
            completed += 1;
            progress::emit(progress, generation, LoadPhase::Loading { completed, total });
        }

        let mut posts: Vec<Post> = slots.into_iter().flatten().collect();
        posts.sort_by(|a, b| b.id().cmp(a.id()));
        Gallery::from_posts(posts)
    }

    fn from_posts(posts: Vec<Post>) -> Gallery {
        let date_range = match (posts.first(), posts.last()) {
            (Some(newest), Some(oldest)) => Some(DateRange {
                newest: newest.date().to_owned(),
                oldest: oldest.date().to_owned(),
            }),
            _ => None,
        };
        let rows = posts.chunks(ROW_WIDTH).map(<[Post]>::to_vec).collect();
        Gallery { rows, date_range }
    }

    /// Returns the gallery's rows, each at most four posts wide.
    pub fn rows(&self) -> &[Vec<Post>] {
        &self.rows
    }

    /// Iterates over every post in display order.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.rows.iter().flatten()
    }

    /// Returns the number of posts on the page, placeholders included.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Returns `true` when the page holds no posts at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the page's date range, or `None` for an empty page.
    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    /// Switches the displayed image of the identified post.
    pub(crate) fn select_thumbnail(&mut self, post_id: &str, image_url: &str) -> bool {
        self.rows
            .iter_mut()
            .flatten()
            .find(|post| post.id() == post_id)
            .is_some_and(|post| post.select(image_url))
    }
}

/// Resolves one post reference into its gallery entry. Fetch and parse
/// failures degrade to a placeholder, never to an error.
async fn fetch_one<F>(fetcher: &F, slot: usize, source: PostRef) -> (usize, Post)
where
    F: Fetch + Sync,
{
    let body = match fetcher.fetch(source.link()).await {
        Ok(reply) => reply.into_body(),
        Err(error) => Err(error),
    };
    match body {
        Ok(html) => (slot, Post::enriched(source, PostMedia::parse(&html))),
        Err(error) => {
            log::warn!("post {} kept as a placeholder: {error}", source.id());
            (slot, Post::placeholder(source))
        }
    }
}
