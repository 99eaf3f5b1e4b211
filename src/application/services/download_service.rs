use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::models::record::CollectionContext,
    application::services::platform_client::PlatformClient,
    error::AppError,
    storage::utils::{extension_from_url, photo_path, write_bytes},
};

/// Saves post images under `<output_dir>/<username>/`.
pub struct PhotoDownloader<C: PlatformClient + ?Sized> {
    client: Arc<C>,
    output_dir: PathBuf,
}

impl<C: PlatformClient + ?Sized> PhotoDownloader<C> {
    pub fn new(client: Arc<C>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Downloads every photo of a post: each carousel item, or the single image.
    ///
    /// Returns the written paths in carousel order. A post id missing from the
    /// collection is `AppError::NotFound`.
    #[instrument(skip(self, ctx), fields(username = %ctx.username))]
    pub async fn download_post_photo(
        &self,
        ctx: &CollectionContext,
        post_id: &str,
    ) -> Result<Vec<PathBuf>, AppError> {
        let post = ctx.post(post_id).ok_or(AppError::NotFound)?;
        let urls = post.image_urls();
        if urls.is_empty() {
            warn!("Post {} has no downloadable image", post_id);
        }

        let mut written = Vec::with_capacity(urls.len());
        for (n, url) in urls {
            let bytes = self.client.download(url).await?;
            let path = photo_path(
                &self.output_dir,
                &ctx.username,
                post_id,
                n,
                &extension_from_url(url),
            );
            write_bytes(&path, &bytes)?;
            debug!("Saved photo {} of post {} to {}", n, post_id, path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Downloads the photos of the `n` most liked posts of the collection.
    pub async fn download_top_posts(
        &self,
        ctx: &CollectionContext,
        n: usize,
    ) -> Result<Vec<PathBuf>, AppError> {
        let mut by_likes: Vec<_> = ctx.records.iter().collect();
        by_likes.sort_by(|a, b| b.like_count.cmp(&a.like_count));

        let mut written = Vec::new();
        for record in by_likes.into_iter().take(n) {
            written.extend(self.download_post_photo(ctx, &record.id).await?);
        }
        info!("Downloaded {} photos for {}", written.len(), ctx.username);
        Ok(written)
    }
}
