use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info};

use ongaku_tag::config::Config;
use ongaku_tag::{
    logger, CatalogSearch, EmbedOutcome, LibrarySession, SaveOutcome, TaggerBackend,
    TaggerClient,
};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Browse the tagged music library and fix covers and album metadata.
#[derive(Parser)]
#[command(name = "ongaku-tag")]
struct Args {
    /// Tagging backend address (overrides ONGAKU_TAG_API_URL).
    #[arg(long)]
    api_url: Option<String>,

    /// Library directory to scan (overrides ONGAKU_TAG_MUSIC_PATH).
    #[arg(long)]
    music_path: Option<String>,

    /// Catalog results per search (overrides ONGAKU_TAG_SEARCH_LIMIT).
    #[arg(long)]
    limit: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the library and list albums.
    Scan,
    /// Search the remote catalog.
    Search { query: String },
    /// Embed the artwork of a catalog result into every track of an album.
    Embed {
        album_id: String,
        remote_id: i64,
        /// Search with this query instead of "<artist> <title>".
        #[arg(long)]
        query: Option<String>,
    },
    /// Update album-level tags. Omitted flags keep their current value.
    Edit {
        album_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        year: Option<String>,
        /// Pass an empty string to clear the tag.
        #[arg(long)]
        genre: Option<String>,
        /// Pass an empty string to clear the tag.
        #[arg(long)]
        composer: Option<String>,
    },
    /// Save the current artwork of an album.
    Cover { album_id: String, out: PathBuf },
    /// Download the full size artwork of a catalog result.
    Download {
        query: String,
        remote_id: i64,
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(api_url) = args.api_url.clone() {
        config.api_url = api_url;
    }
    if args.music_path.is_some() {
        config.music_path = args.music_path.clone();
    }
    if let Some(limit) = args.limit {
        config.search_limit = limit;
    }
    logger::init(config.log_level).ok();

    if let Err(e) = run(args.command, &config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, config: &Config) -> CliResult {
    let client = TaggerClient::new(&config.api_url, config.timeout())?
        .with_music_path(config.music_path.clone())
        .with_country(config.search_country.clone());
    let covers = client.covers().clone();
    let backend = Arc::new(client);
    let session = LibrarySession::new(backend.clone(), covers, config.search_limit);

    match command {
        Command::Scan => {
            session.mount().await?;
            for tile in session.tiles() {
                println!(
                    "{}  {} - {} ({}){}",
                    tile.id,
                    tile.artist,
                    tile.title,
                    tile.year,
                    tile.cover_url.map(|_| "  [cover]").unwrap_or_default()
                );
            }
        }
        Command::Search { query } => {
            let search = CatalogSearch::new(backend.clone());
            for candidate in search.search(&query, config.search_limit).await? {
                println!(
                    "{}  {} - {} ({})",
                    candidate.remote_id,
                    candidate.artist,
                    candidate.album,
                    candidate.release_year()
                );
            }
        }
        Command::Embed {
            album_id,
            remote_id,
            query,
        } => {
            session.mount().await?;
            let detail = session
                .open_detail(&album_id)
                .ok_or_else(|| format!("no album with id {}", album_id))?;
            let picker = detail.open_picker().await;
            if let Some(query) = query {
                picker.set_query(&query);
                picker.search().await?;
            }
            match detail.choose_cover(remote_id).await? {
                EmbedOutcome::Embedded { .. } => info!("Cover embedded into {}", album_id),
                EmbedOutcome::Ignored => {
                    return Err(format!("no search result with id {}", remote_id).into())
                }
            }
        }
        Command::Edit {
            album_id,
            title,
            artist,
            year,
            genre,
            composer,
        } => {
            session.mount().await?;
            let detail = session
                .open_detail(&album_id)
                .ok_or_else(|| format!("no album with id {}", album_id))?;
            let editor = detail.open_editor();
            editor.edit(|form| {
                if let Some(title) = title {
                    form.title = title;
                }
                if let Some(artist) = artist {
                    form.artist = artist;
                }
                if let Some(year) = year {
                    form.year = year;
                }
                if let Some(genre) = genre {
                    form.set_genre(&genre);
                }
                if let Some(composer) = composer {
                    form.set_composer(&composer);
                }
            });
            if detail.save_metadata().await? == SaveOutcome::Saved {
                info!("Metadata of {} updated", album_id);
            }
        }
        Command::Cover { album_id, out } => {
            session.mount().await?;
            let album = session
                .select(&album_id)
                .ok_or_else(|| format!("no album with id {}", album_id))?;
            if !album.has_cover {
                return Err(format!("album {} has no cover", album_id).into());
            }
            let image = backend.fetch_cover(&album.sample_file).await?;
            let path = if out.is_dir() {
                out.join(format!("{}.{}", album.id, image.extension()))
            } else {
                out
            };
            image.save(&path).await?;
        }
        Command::Download {
            query,
            remote_id,
            dir,
        } => {
            let search = CatalogSearch::new(backend.clone());
            let candidate = search
                .search(&query, config.search_limit)
                .await?
                .into_iter()
                .find(|c| c.remote_id == remote_id)
                .ok_or_else(|| format!("no search result with id {}", remote_id))?;
            let image = backend.download(&candidate.high_res_artwork_url).await?;
            image.save(&dir.join(candidate.suggested_filename())).await?;
        }
    }

    Ok(())
}
