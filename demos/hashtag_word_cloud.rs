use chrono::{Duration, Utc};
use insta_analytics::application::services::analyzer_service::{AnalyzerConfig, HashtagAnalyzer};
use insta_analytics::application::services::download_service::PhotoDownloader;
use insta_analytics::application::services::feed_service::FeedService;
use insta_analytics::application::services::platform_client::InstagramClient;
use insta_analytics::config::Config;
use insta_analytics::constants::DEFAULT_TOP_POSTS;
use insta_analytics::presentation::word_cloud::{make_hashtag_word_cloud, WordCloudOptions};
use insta_analytics::session::session::Session;
use insta_analytics::utils::logger::setup_logger;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger();
    let username = std::env::args().nth(1).unwrap_or_else(|| "instagram".to_string());
    let cfg = Config::new();

    let mut session = Session::new(cfg.clone())?;
    session.ensure_auth().await?;
    let client = Arc::new(InstagramClient::from_session(&session)?);
    let cancel = CancellationToken::new();

    let ctx = FeedService::new(client.clone())
        .collect_user_posts(&username, Utc::now() - Duration::days(90), &cancel)
        .await?
        .into_inner();

    let output_dir = Path::new(&cfg.storage.output_dir);
    let photos = PhotoDownloader::new(client.clone(), output_dir)
        .download_top_posts(&ctx, DEFAULT_TOP_POSTS)
        .await?;
    info!("Saved {} photos", photos.len());

    let analyzer = HashtagAnalyzer::new(client, AnalyzerConfig::from(&cfg.analysis));
    let mut rng = StdRng::from_entropy();
    let analysis = analyzer.analyze_top_posts(&ctx, 3, &mut rng, &cancel).await?;
    for warning in &analysis.warnings {
        warn!("{}", warning);
    }
    for row in analysis.value.ranked.iter().take(20) {
        info!("{:>5} {}", row.count, row.hashtag);
    }

    let cloud = make_hashtag_word_cloud(
        &ctx,
        &analysis.value.ranked,
        50,
        output_dir,
        &WordCloudOptions::default(),
    )?;
    info!("Word cloud written to {}", cloud.value.display());

    session.logout().await?;
    Ok(())
}
