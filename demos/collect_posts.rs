use chrono::{TimeZone, Utc};
use insta_analytics::application::services::feed_service::FeedService;
use insta_analytics::application::services::platform_client::InstagramClient;
use insta_analytics::config::Config;
use insta_analytics::session::session::Session;
use insta_analytics::storage::utils::export_records_csv;
use insta_analytics::utils::logger::setup_logger;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger();
    let username = std::env::args().nth(1).unwrap_or_else(|| "instagram".to_string());
    let cfg = Config::new();
    info!("Loaded config: {}", cfg);

    let mut session = match Session::from_cookie_file(cfg.clone(), &cfg.session.cookie_path) {
        Ok(session) => session,
        Err(e) => {
            warn!("No usable cookie file ({e:#}), logging in");
            Session::new(cfg.clone())?
        }
    };
    session.ensure_auth().await?;
    session.dump_cookie_default()?;

    let client = Arc::new(InstagramClient::from_session(&session)?);
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let start_date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let reported = FeedService::new(client)
        .collect_user_posts(&username, start_date, &cancel)
        .await?;
    for warning in &reported.warnings {
        warn!("{}", warning);
    }
    let ctx = reported.into_inner();
    info!("Collected {} posts in {} requests", ctx.records.len(), ctx.fetches);

    let path = Path::new(&cfg.storage.output_dir).join(format!("{}_posts.csv", ctx.username));
    export_records_csv(&path, &ctx.records)?;
    info!("Wrote {}", path.display());
    Ok(())
}
