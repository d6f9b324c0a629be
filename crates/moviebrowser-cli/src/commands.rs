//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use moviebrowser_core::{ImageConfig, Movie, MovieBrowser, MovieCollection};
use std::sync::Arc;
use tracing::info;

const POSTER_WIDTH: i32 = 185;

fn print_movie(browser: &MovieBrowser, movie: &Movie) {
    let star = if movie.is_favorite() { "*" } else { " " };
    let year = movie
        .release_date()
        .and_then(|d| d.get(..4))
        .unwrap_or("----");
    println!(
        "{} {:>8}  {}  {:.1}/5  {}",
        star,
        movie.id(),
        year,
        movie.rating(),
        movie.title()
    );
    if let Some(poster) = movie.poster_path() {
        println!(
            "           {}{}",
            browser.image_config().poster_base_url(POSTER_WIDTH),
            poster
        );
    }
}

async fn load_pages(collection: &dyn MovieCollection, pages: u32) -> Result<()> {
    for _ in 0..pages.max(1) {
        if !collection.has_next_page() {
            break;
        }
        collection.load_next_page().await?;
    }
    Ok(())
}

pub async fn now_playing(browser: &MovieBrowser, pages: u32) -> Result<()> {
    // Favorites first so the list can mark them.
    browser.favorites().load().await?;
    let now_playing = browser.now_playing();
    load_pages(now_playing, pages).await?;

    for movie in now_playing.movies() {
        print_movie(browser, &movie);
    }
    info!("{} movies now playing", now_playing.len());
    Ok(())
}

pub async fn similar(browser: &MovieBrowser, id: i64, pages: u32) -> Result<()> {
    browser.favorites().load().await?;
    let movie = browser
        .movie(id)
        .await
        .with_context(|| format!("Failed to look up movie {}", id))?;
    let similar = movie.similar_movies();
    let result = load_pages(&similar, pages).await;

    println!("Movies similar to {}:", movie.title());
    for other in similar.movies() {
        print_movie(browser, &other);
    }
    movie.release_similar_movies();
    result
}

pub async fn details(browser: &MovieBrowser, id: i64) -> Result<()> {
    let movie = browser.movie(id).await?;
    if movie.details().is_none() {
        movie.load_details().await?;
    }

    print_movie(browser, &movie);
    if let Some(overview) = movie.overview() {
        println!("\n{}\n", overview);
    }
    if let Some(details) = movie.details() {
        if let Some(tagline) = &details.tagline {
            println!("Tagline:  {}", tagline);
        }
        if let Some(runtime) = details.runtime {
            println!("Runtime:  {} min", runtime);
        }
        if !details.genres.is_empty() {
            println!("Genres:   {}", details.genres.join(", "));
        }
        if let Some(homepage) = &details.homepage {
            println!("Homepage: {}", homepage);
        }
    }
    Ok(())
}

pub async fn list_favorites(browser: &MovieBrowser) -> Result<()> {
    let favorites = browser.favorites();
    favorites.load().await?;
    if favorites.is_empty() {
        println!("No favorites yet.");
    }
    for movie in favorites.movies() {
        print_movie(browser, &movie);
    }
    Ok(())
}

async fn favorite_movie(browser: &MovieBrowser, id: i64) -> Result<Arc<Movie>> {
    browser.favorites().load().await?;
    Ok(browser.movie(id).await?)
}

pub async fn add_favorite(browser: &MovieBrowser, id: i64) -> Result<()> {
    let movie = favorite_movie(browser, id).await?;
    if movie.is_favorite() {
        println!("{} is already a favorite.", movie.title());
        return Ok(());
    }
    if !browser.favorites().add_to_favorite(&movie).await? {
        bail!("Favorite store did not accept movie {}", id);
    }
    println!("Added {} to favorites.", movie.title());
    Ok(())
}

pub async fn remove_favorite(browser: &MovieBrowser, id: i64) -> Result<()> {
    let movie = favorite_movie(browser, id).await?;
    if !movie.is_favorite() {
        println!("{} is not a favorite.", movie.title());
        return Ok(());
    }
    if !browser.favorites().remove_from_favorite(&movie).await? {
        bail!("Favorite store did not remove movie {}", id);
    }
    println!("Removed {} from favorites.", movie.title());
    Ok(())
}

pub async fn clear(browser: &MovieBrowser, favorites: bool) -> Result<()> {
    if favorites {
        browser.favorites().load().await?;
    }
    let mut stages = browser.clear_data(favorites);
    while let Some(stage) = stages.next().await {
        println!("{}", stage?);
    }
    Ok(())
}
