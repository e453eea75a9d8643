use hianime_core::{ExtractionResult, Extractor, HiAnimeClient, HiAnimeExtractor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_URL: &str = "https://hianime.to/watch/the-eminence-in-shadow-17473?ep=94440";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hianime_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());

    let mut extractor = HiAnimeExtractor::new(HiAnimeClient::new()?);
    if !extractor.suitable(&url) {
        return Err(format!("unsupported URL: {}", url).into());
    }

    let result = extractor.extract(&url).await?;
    match &result {
        ExtractionResult::Playlist(playlist) => tracing::info!(
            title = playlist.title.as_deref().unwrap_or("?"),
            episodes = playlist.entries.len(),
            "resolved playlist"
        ),
        ExtractionResult::Episode(episode) => tracing::info!(
            title = episode.title.as_deref().unwrap_or("?"),
            formats = episode.formats.len(),
            subtitles = episode.subtitles.len(),
            "resolved episode"
        ),
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
