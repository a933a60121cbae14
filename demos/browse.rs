//! Example demonstrating how to browse a forum's image posts through a caching proxy
//!
//! This example shows:
//! - Creating a client against a proxy endpoint
//! - Starting a session and selecting a forum
//! - Following load progress while the gallery is assembled
//! - Printing the loaded page and stepping to older posts

use clpics::{Client, Gallery, Session};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // setting up logging.
    SimpleLogger::new().init()?;

    // The proxy endpoint and forum id can be overridden from the command line.
    let mut args = std::env::args().skip(1);
    let proxy = args
        .next()
        .unwrap_or_else(|| String::from("http://localhost:8080/proxy.php"));
    let forum = args.next().unwrap_or_else(|| String::from("3"));

    // Create a client for the proxy and start a session on it
    let client = Client::new(&proxy)?;
    let mut session = Session::new(client);

    // Print the load phases as they are broadcast
    let mut progress = session.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = progress.recv().await {
            println!("{}", event.phase);
        }
    });

    // Select a forum and load its newest page of image posts
    let request = session.select_forum(&forum);
    if let Some(gallery) = session.load(request).await? {
        print_page(gallery);
    }

    // Step one page towards older posts
    if let Some(request) = session.older() {
        if let Some(gallery) = session.load(request).await? {
            print_page(gallery);
        }
    }

    // Dropping the session closes the progress channel
    drop(session);
    reporter.await?;

    Ok(())
}

fn print_page(gallery: &Gallery) {
    if let Some(range) = gallery.date_range() {
        println!("{} posts, {range}", gallery.len());
    }
    for post in gallery.posts() {
        println!("{post}");
    }
}
