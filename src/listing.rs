//! Listing-page scraping.
//!
//! A listing page carries the two things a page load needs first: the
//! pagination cursor hidden in the pager links, and the run of thread lines
//! inside the threads table. The forum serves both as presentation markup
//! with no stability promise, so every selector and marker string the crate
//! relies on is confined to this module and to [`crate::post`].

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::Error;
use crate::result::Result;

/// Marks a thread line as carrying at least one image.
const PIC_MARKER: &str = r#"<span class="R">pic</span>"#;
/// Separates thread lines inside the threads cell.
const LINE_BREAK: &str = "<br>";
/// Query fragment identifying the day-view pager link.
const DAY_VIEW: &str = "batch=day";
/// Query parameter carrying the pagination cursor.
const BATCH_PARAM: &str = "batch=";
/// Query parameter suffix carrying a post identifier.
const ID_PARAM: &str = "ID=";

static BATCH_ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="batch"]"#).expect("valid selector"));
static THREADS_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.threads td").expect("valid selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static DATE_FONT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("font").expect("valid selector"));

/// Extracts the forum's pagination cursor from a listing page.
///
/// The cursor is the `batch` value of the first pager link that is not the
/// day view. The forum serves page one without a cursor; every deeper page
/// of the same forum is addressed relative to this value.
///
/// # Errors
///
/// Returns [`Error::CursorMissing`] when the page has no usable pager link
/// and [`Error::CursorValue`] when the link's batch value does not parse.
pub fn resolve_cursor(listing_html: &str) -> Result<u32> {
    let document = Html::parse_document(listing_html);
    let href = document
        .select(&BATCH_ANCHORS)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find(|href| !href.contains(DAY_VIEW))
        .ok_or(Error::CursorMissing)?;

    let (_, tail) = href
        .split_once(BATCH_PARAM)
        .ok_or_else(|| Error::CursorValue(href.to_owned()))?;
    let value = match tail.find('&') {
        Some(at) => &tail[..at],
        None => tail,
    };
    value
        .parse()
        .map_err(|_| Error::CursorValue(value.to_owned()))
}

/// One image-marked thread line lifted from a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub(crate) id: String,
    pub(crate) link: String,
    pub(crate) date: String,
}

impl PostRef {
    #[cfg(test)]
    pub(crate) fn new(id: &str, link: &str, date: &str) -> PostRef {
        PostRef {
            id: id.to_owned(),
            link: link.to_owned(),
            date: date.to_owned(),
        }
    }

    /// Returns the post's identifier, the gallery's sort key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the listing-page link addressing the post's detail page.
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Returns the post's display date as scraped, markup stripped.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Lifts one thread line into a reference. Lines missing their anchor,
    /// id or date are malformed and yield `None`.
    fn from_fragment(fragment: &str) -> Option<PostRef> {
        let line = Html::parse_fragment(fragment);
        let link = line
            .select(&ANCHOR)
            .next()?
            .value()
            .attr("href")?
            .to_owned();
        let id = id_in_link(&link)?;
        let date = date_text(line.select(&DATE_FONT).next()?);
        Some(PostRef { id, link, date })
    }
}

/// The digit run following the last `ID=` in a post link.
fn id_in_link(link: &str) -> Option<String> {
    let (_, tail) = link.rsplit_once(ID_PARAM)?;
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// The date cell's text up to its first child element, with non-breaking
/// spaces removed in both their entity and decoded forms.
fn date_text(font: ElementRef<'_>) -> String {
    let inner = font.inner_html();
    let date = match inner.find('<') {
        Some(at) => &inner[..at],
        None => inner.as_str(),
    };
    date.replace("&nbsp;", "").replace('\u{a0}', "")
}

/// The image-marked posts found on one listing page.
///
/// Dereferences to a slice of [`PostRef`] in listing order.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    posts: Vec<PostRef>,
}

impl Listing {
    /// Scrapes a listing page into its image-marked post references.
    ///
    /// Thread lines without the image marker are discarded, malformed lines
    /// are skipped without aborting the rest, and posts are deduplicated by
    /// id with listing order preserved. An empty result is the normal
    /// outcome for a batch without images, not an error.
    pub fn parse(listing_html: &str) -> Listing {
        let document = Html::parse_document(listing_html);
        let Some(cell) = document.select(&THREADS_CELL).next() else {
            return Listing::default();
        };

        let mut seen = HashSet::new();
        let mut posts = Vec::new();
        for line in cell.inner_html().split(LINE_BREAK) {
            if !line.contains(PIC_MARKER) {
                continue;
            }
            let Some(post) = PostRef::from_fragment(line) else {
                continue;
            };
            if seen.insert(post.id.clone()) {
                posts.push(post);
            }
        }
        Listing { posts }
    }

    /// Consumes the listing, yielding its post references.
    pub fn into_posts(self) -> Vec<PostRef> {
        self.posts
    }
}

impl Deref for Listing {
    type Target = [PostRef];

    fn deref(&self) -> &Self::Target {
        &self.posts
    }
}
