//! Post detail pages and the gallery's per-post view model.
//!
//! A [`PostRef`] from the listing stage promises a post; fetching its detail
//! page and running [`PostMedia::parse`] over the HTML turns that promise
//! into a [`Post`]. Extraction is best-effort: a page without a usable image
//! still produces a `Post`, rendered as a placeholder.
//!
//! ```
//! use clpics::post::PostMedia;
//!
//! let html = r#"<span class="quote"><img src="https://images.example.org/a.jpg"></span>"#;
//! let media = PostMedia::parse(html);
//!
//! assert_eq!(media.images(), ["https://images.example.org/a.jpg"]);
//! ```

use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::listing::PostRef;

static QUOTED_IMAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.quote img").expect("valid selector"));
static PERMALINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.pln").expect("valid selector"));

/// The media lifted from one post detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostMedia {
    images: Vec<String>,
    permalink: Option<String>,
}

impl PostMedia {
    /// Scrapes a post detail page for its embedded images and permalink.
    ///
    /// Images are the `src` attributes of every image inside the quoted
    /// content region, in document order; images without a `src` are
    /// skipped. The permalink is the href of the last permalink-classed
    /// anchor. Missing pieces degrade to an empty collection or `None`
    /// rather than an error.
    pub fn parse(post_html: &str) -> PostMedia {
        let document = Html::parse_document(post_html);
        let images = document
            .select(&QUOTED_IMAGES)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_owned)
            .collect();
        let permalink = document
            .select(&PERMALINK)
            .last()
            .and_then(|anchor| anchor.value().attr("href"))
            .map(str::to_owned);
        PostMedia { images, permalink }
    }

    /// Returns the extracted image URLs in document order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Returns the post's canonical permalink, when the page carried one.
    pub fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref()
    }
}

/// One post of a finalized gallery page.
///
/// Carries everything a render layer needs: the scraped identity fields, the
/// image to show, and the thumbnail strip for posts with more than one
/// image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    id: String,
    link: String,
    date: String,
    images: Vec<String>,
    permalink: Option<String>,
    selected: usize,
}

impl Post {
    /// Builds a post whose detail page resolved.
    pub(crate) fn enriched(source: PostRef, media: PostMedia) -> Post {
        let PostRef { id, link, date } = source;
        Post {
            id,
            link,
            date,
            images: media.images,
            permalink: media.permalink,
            selected: 0,
        }
    }

    /// Builds the placeholder kept in the gallery when a detail page could
    /// not be fetched.
    pub(crate) fn placeholder(source: PostRef) -> Post {
        let PostRef { id, link, date } = source;
        Post {
            id,
            link,
            date,
            images: Vec::new(),
            permalink: None,
            selected: 0,
        }
    }

    /// Returns the post's identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the listing-page link the post was discovered through.
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Returns the post's display date.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Returns the canonical permalink from the detail page, if any.
    pub fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref()
    }

    /// Returns every image extracted from the post.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Returns the image currently selected for display, or `None` for a
    /// placeholder.
    pub fn image(&self) -> Option<&str> {
        self.images.get(self.selected).map(String::as_str)
    }

    /// Returns the thumbnail strip. Posts with at most one image have no
    /// strip.
    pub fn thumbnails(&self) -> &[String] {
        if self.images.len() > 1 {
            &self.images
        } else {
            &[]
        }
    }

    /// Selects the image to display by URL.
    ///
    /// Returns `false` when the post holds no such image; the selection is
    /// left unchanged.
    pub fn select(&mut self, image_url: &str) -> bool {
        match self.images.iter().position(|src| src == image_url) {
            Some(at) => {
                self.selected = at;
                true
            }
            None => false,
        }
    }

    /// Returns `true` for posts whose detail fetch or parse yielded no
    /// usable image.
    pub fn is_placeholder(&self) -> bool {
        self.images.is_empty()
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.image() {
            Some(url) => write!(f, "{} [{}] {url}", self.id, self.date),
            None => write!(f, "{} [{}] no image", self.id, self.date),
        }
    }
}
