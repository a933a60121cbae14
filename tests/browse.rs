//! End-to-end tests driving a [`Session`] against a stubbed proxy endpoint.

use std::collections::HashMap;

use clpics::{Client, Error, Gallery, LoadPhase, ProgressReceiver, Session};
use url::form_urlencoded;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Stands in for the caching proxy: answers `POST`s by decoding the `qs`
/// form field and serving the page scripted for that query, or a 404 when
/// the query is unknown.
struct ProxyStub {
    pages: HashMap<String, String>,
}

impl ProxyStub {
    fn new() -> ProxyStub {
        ProxyStub {
            pages: HashMap::new(),
        }
    }

    fn page(mut self, query: &str, body: &str) -> ProxyStub {
        self.pages.insert(query.to_owned(), body.to_owned());
        self
    }

    async fn mount(self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/proxy.php"))
            .respond_with(self)
            .mount(&server)
            .await;
        server
    }
}

impl Respond for ProxyStub {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query = form_urlencoded::parse(&request.body)
            .find(|(key, _)| key == "qs")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        match self.pages.get(&query) {
            Some(body) => ResponseTemplate::new(200).set_body_string(body),
            None => ResponseTemplate::new(404),
        }
    }
}

fn session_for(server: &MockServer) -> Session {
    let client = Client::new(&format!("{}/proxy.php", server.uri())).expect("valid endpoint");
    Session::new(client)
}

/// One image-marked thread line as the forum lists it.
fn post_line(id: u32, date: &str) -> String {
    format!(
        r#"<a href="?act=ST&forumID=3&ID={id}">thread {id}</a> <font size="-1">{date}&nbsp;<i>9:38am</i></font> <span class="R">pic</span>"#
    )
}

/// A thread line without the image marker.
fn plain_line(id: u32, date: &str) -> String {
    format!(
        r#"<a href="?act=ST&forumID=3&ID={id}">thread {id}</a> <font size="-1">{date}&nbsp;<i>7:10am</i></font>"#
    )
}

fn listing_page(pager_href: &str, lines: &[String]) -> String {
    format!(
        r#"<html><body>
<p class="pager">
<a href="?act=DF&forumID=3&batch=day&node=0">day view</a>
<a href="{pager_href}">older posts</a>
</p>
<table class="threads"><tbody><tr><td>
{}
</td></tr></tbody></table>
</body></html>"#,
        lines.join("<br>\n")
    )
}

fn detail_page(images: &[&str], permalink: &str) -> String {
    let imgs: String = images
        .iter()
        .map(|src| format!(r#"<img src="{src}">"#))
        .collect();
    format!(
        r#"<html><body>
<span class="quote">selling, see pics {imgs}</span>
<a class="pln" href="{permalink}">permalink</a>
</body></html>"#
    )
}

fn detail_query(id: u32) -> String {
    format!("?act=ST&forumID=3&ID={id}")
}

fn image_url(id: u32, n: u32) -> String {
    format!("https://images.example.org/{id}-{n}.jpg")
}

fn gallery_ids(gallery: &Gallery) -> Vec<&str> {
    gallery.posts().map(|post| post.id()).collect()
}

fn drain(rx: &mut ProgressReceiver) -> Vec<LoadPhase> {
    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        phases.push(event.phase);
    }
    phases
}

/// Scripts a five-post first page of forum 3 with a `batch=150` pager link.
fn first_page_stub() -> ProxyStub {
    let lines = vec![
        post_line(101, "12/10/2012"),
        post_line(102, "12/11/2012"),
        plain_line(990, "12/11/2012"),
        post_line(103, "12/12/2012"),
        post_line(104, "12/13/2012"),
        post_line(105, "12/14/2012"),
    ];
    let listing = listing_page("?act=DF&forumID=3&node=0&areaID=1&batch=150&old=yes", &lines);

    let mut stub = ProxyStub::new().page("?act=DF&forumID=3", &listing);
    for (id, image_count) in [(101, 1), (102, 2), (103, 3), (104, 1), (105, 2)] {
        let images: Vec<String> = (1..=image_count).map(|n| image_url(id, n)).collect();
        let image_refs: Vec<&str> = images.iter().map(String::as_str).collect();
        let permalink = format!("https://forums.example.org/?ID={id}");
        stub = stub.page(&detail_query(id), &detail_page(&image_refs, &permalink));
    }
    stub
}

#[tokio::test]
async fn a_forum_page_loads_into_a_sorted_gallery() {
    let server = first_page_stub().mount().await;
    let mut session = session_for(&server);
    let mut rx = session.subscribe();

    let request = session.select_forum("3");
    let gallery = session
        .load(request)
        .await
        .expect("page load failed")
        .expect("request was current")
        .clone();

    // Five image posts, newest first, cut into a row of four plus one.
    assert_eq!(gallery.len(), 5);
    assert_eq!(gallery_ids(&gallery), ["105", "104", "103", "102", "101"]);
    assert_eq!(gallery.rows().len(), 2);
    assert_eq!(gallery.rows()[0].len(), 4);
    assert_eq!(gallery.rows()[1].len(), 1);

    let range = gallery.date_range().expect("non-empty page has a range");
    assert_eq!(range.newest(), "12/14/2012");
    assert_eq!(range.oldest(), "12/10/2012");

    let post = gallery.posts().find(|post| post.id() == "103").unwrap();
    assert_eq!(post.image(), Some(image_url(103, 1).as_str()));
    assert_eq!(post.thumbnails().len(), 3);
    assert_eq!(
        post.permalink(),
        Some("https://forums.example.org/?ID=103")
    );

    // The pager link resolved the cursor for deeper pages.
    assert_eq!(session.cursor(), Some(150));

    let phases = drain(&mut rx);
    assert_eq!(phases[0], LoadPhase::Querying);
    assert_eq!(phases[1], LoadPhase::Filtering { posts: 5 });
    let loads: Vec<LoadPhase> = phases
        .iter()
        .filter(|phase| matches!(phase, LoadPhase::Loading { .. }))
        .cloned()
        .collect();
    let expected: Vec<LoadPhase> = (1..=5)
        .map(|completed| LoadPhase::Loading {
            completed,
            total: 5,
        })
        .collect();
    assert_eq!(loads, expected);
    assert_eq!(phases.last(), Some(&LoadPhase::Done { posts: 5 }));
}

#[tokio::test]
async fn deeper_pages_reuse_the_resolved_cursor() {
    let lines = vec![
        post_line(71, "12/01/2012"),
        post_line(72, "12/02/2012"),
        post_line(73, "12/03/2012"),
    ];
    let second_listing = listing_page("?act=DF&forumID=3&batch=150&old=yes", &lines);

    let mut stub = first_page_stub().page(
        "?act=DF&forumID=3&node=0&areaID=1&old=yes&batch=150",
        &second_listing,
    );
    for id in [71, 72, 73] {
        let image = image_url(id, 1);
        let permalink = format!("https://forums.example.org/?ID={id}");
        stub = stub.page(&detail_query(id), &detail_page(&[&image], &permalink));
    }
    let server = stub.mount().await;
    let mut session = session_for(&server);

    let request = session.select_forum("3");
    session.load(request).await.expect("first page failed");

    let request = session.navigate(2).expect("cursor is resolved");
    assert_eq!(
        request.query(),
        "?act=DF&forumID=3&node=0&areaID=1&old=yes&batch=150"
    );
    let gallery = session
        .load(request)
        .await
        .expect("second page failed")
        .expect("request was current");
    assert_eq!(gallery_ids(gallery), ["73", "72", "71"]);
    assert_eq!(session.pager().unwrap().current(), 2);
    assert!(session.pager().unwrap().newer_enabled());

    // Each further page steps one batch of thirty older.
    let request = session.navigate(3).expect("cursor is resolved");
    assert!(request.query().ends_with("&batch=120"));
}

#[tokio::test]
async fn a_batch_without_images_is_a_normal_empty_outcome() {
    let lines = vec![plain_line(55, "12/05/2012"), plain_line(56, "12/06/2012")];
    let listing = listing_page("?act=DF&forumID=3&batch=150&old=yes", &lines);
    let server = ProxyStub::new()
        .page("?act=DF&forumID=3", &listing)
        .mount()
        .await;
    let mut session = session_for(&server);
    let mut rx = session.subscribe();

    let request = session.select_forum("3");
    let gallery = session
        .load(request)
        .await
        .expect("empty batches are not errors")
        .expect("request was current");

    assert!(gallery.is_empty());
    assert!(gallery.date_range().is_none());
    assert_eq!(drain(&mut rx), [LoadPhase::Querying, LoadPhase::Empty]);
}

#[tokio::test]
async fn a_listing_without_a_usable_cursor_fails_the_load() {
    // Only the day-view pager link is present, so the cursor cannot be
    // resolved and the whole page load is abandoned.
    let listing = format!(
        r#"<html><body>
<p class="pager"><a href="?act=DF&forumID=3&batch=day">day view</a></p>
<table class="threads"><tbody><tr><td>
{}
</td></tr></tbody></table>
</body></html>"#,
        post_line(101, "12/10/2012")
    );
    let server = ProxyStub::new()
        .page("?act=DF&forumID=3", &listing)
        .mount()
        .await;
    let mut session = session_for(&server);
    let mut rx = session.subscribe();

    let request = session.select_forum("3");
    let result = session.load(request).await;

    assert!(matches!(result, Err(Error::CursorMissing)));
    assert!(session.gallery().is_none());
    let phases = drain(&mut rx);
    assert_eq!(phases[0], LoadPhase::Querying);
    assert_eq!(
        phases[1],
        LoadPhase::Failed {
            message: String::from(
                "Sorry, there was a problem loading the forum pages. Try another forum."
            )
        }
    );
}

#[tokio::test]
async fn failed_detail_fetches_surface_as_placeholders() {
    let lines = vec![
        post_line(201, "12/01/2012"),
        post_line(202, "12/02/2012"),
        post_line(203, "12/03/2012"),
    ];
    let listing = listing_page("?act=DF&forumID=3&batch=90&old=yes", &lines);
    // Post 202 has no scripted detail page, so the stub answers 404 for it.
    let server = ProxyStub::new()
        .page("?act=DF&forumID=3", &listing)
        .page(
            &detail_query(201),
            &detail_page(&[&image_url(201, 1)], "https://forums.example.org/?ID=201"),
        )
        .page(
            &detail_query(203),
            &detail_page(&[&image_url(203, 1)], "https://forums.example.org/?ID=203"),
        )
        .mount()
        .await;
    let mut session = session_for(&server);

    let request = session.select_forum("3");
    let gallery = session
        .load(request)
        .await
        .expect("post failures never fail the page")
        .expect("request was current");

    assert_eq!(gallery.len(), 3);
    assert_eq!(gallery_ids(gallery), ["203", "202", "201"]);
    let placeholder = gallery.posts().find(|post| post.id() == "202").unwrap();
    assert!(placeholder.is_placeholder());
    assert_eq!(placeholder.image(), None);
}

#[tokio::test]
async fn page_one_stays_reachable_and_page_zero_is_ignored() {
    let server = first_page_stub().mount().await;
    let mut session = session_for(&server);

    let request = session.select_forum("3");
    session.load(request).await.expect("first page failed");

    session.navigate(4).expect("cursor is resolved");
    assert!(session.navigate(0).is_none());
    assert_eq!(session.pager().unwrap().current(), 4);

    let back = session.navigate(1).expect("page one needs no cursor");
    assert_eq!(back.query(), "?act=DF&forumID=3");
    assert!(!session.pager().unwrap().newer_enabled());

    let gallery = session
        .load(back)
        .await
        .expect("page one reloads")
        .expect("request was current");
    assert_eq!(gallery.len(), 5);
}

#[tokio::test]
async fn crossing_the_window_boundary_renumbers_before_the_load_resolves() {
    let server = first_page_stub().mount().await;
    let mut session = session_for(&server);

    let request = session.select_forum("3");
    session.load(request).await.expect("first page failed");

    session.navigate(10).expect("cursor is resolved");
    assert_eq!(session.pager().unwrap().pages(), 1..=10);

    // Moving to page 11 shifts the visible window immediately, while the
    // request itself is still unresolved.
    let request = session.navigate(11).expect("cursor is resolved");
    assert_eq!(session.pager().unwrap().pages(), 11..=20);
    assert_eq!(session.pager().unwrap().current(), 11);
    assert!(request.query().ends_with("&batch=-120"));
}

#[tokio::test]
async fn a_load_superseded_by_a_newer_command_is_discarded() {
    let other_listing = listing_page(
        "?act=DF&forumID=7&batch=60&old=yes",
        &[post_line(301, "11/20/2012")],
    );
    let server = first_page_stub()
        .page(
            "?act=DF&forumID=7",
            &other_listing.replace("forumID=3", "forumID=7"),
        )
        .page(
            "?act=ST&forumID=7&ID=301",
            &detail_page(&[&image_url(301, 1)], "https://forums.example.org/?ID=301"),
        )
        .mount()
        .await;
    let mut session = session_for(&server);
    let mut rx = session.subscribe();

    let stale = session.select_forum("3");
    let current = session.select_forum("7");

    let outcome = session.load(stale).await.expect("stale loads are not errors");
    assert!(outcome.is_none());
    assert!(drain(&mut rx).is_empty());

    let gallery = session
        .load(current)
        .await
        .expect("current load failed")
        .expect("request was current");
    assert_eq!(gallery_ids(gallery), ["301"]);
}

#[tokio::test]
async fn cache_served_pages_parse_like_fresh_ones() {
    let lines = vec![post_line(42, "12/08/2012")];
    let listing = listing_page("?act=DF&forumID=3&batch=30&old=yes", &lines);
    let cached = format!("{listing}[from cache]");
    let server = ProxyStub::new()
        .page("?act=DF&forumID=3", &cached)
        .page(
            &detail_query(42),
            &detail_page(&[&image_url(42, 1)], "https://forums.example.org/?ID=42"),
        )
        .mount()
        .await;
    let mut session = session_for(&server);

    let request = session.select_forum("3");
    let gallery = session
        .load(request)
        .await
        .expect("cached page failed")
        .expect("request was current");

    assert_eq!(gallery_ids(gallery), ["42"]);
    assert_eq!(session.cursor(), Some(30));
}
