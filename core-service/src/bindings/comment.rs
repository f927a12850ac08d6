//! Comments per video

use super::SyncEnv;
use crate::api::CatalogApi;
use core_library::models::Comment;
use core_library::repositories::{CommentRepository, Page, PageRequest};
use core_library::LibraryError;
use core_sync::{
    is_remote_only_page, persist_page, stamp_refreshed, synced_read, FreshnessPolicy,
    FreshnessSnapshot, RemoteError, Resource, SyncError,
};
use futures::stream::BoxStream;
use std::sync::Arc;

pub struct CommentSync {
    comments: Arc<dyn CommentRepository>,
    api: Arc<dyn CatalogApi>,
    env: SyncEnv,
}

impl CommentSync {
    pub fn new(comments: Arc<dyn CommentRepository>, api: Arc<dyn CatalogApi>, env: SyncEnv) -> Self {
        Self { comments, api, env }
    }

    /// One page of comments on `video_id`, newest first.
    ///
    /// The first page refetches when the video has no cached comments or the
    /// oldest one has outlived the comment TTL.
    pub fn comments(&self, video_id: &str, page: u32) -> BoxStream<'_, Resource<Page<Comment>>> {
        let request = PageRequest::new(page, self.env.page_size);
        let remote_only = is_remote_only_page(request.page);
        let store = self.comments.as_ref();
        let local_id = video_id.to_string();
        let remote_id = video_id.to_string();
        let check_id = video_id.to_string();
        let policy = FreshnessPolicy::EmptyOrOldest {
            window: self.env.freshness.comment_ttl,
        };

        synced_read(
            move || async move {
                if remote_only {
                    return Ok(Page::new(Vec::new(), 0, request));
                }
                store.find_by_video(&local_id, request).await
            },
            move || async move {
                let mut comments = self
                    .env
                    .caller
                    .call(self.api.fetch_comments(&remote_id, request.page, request.page_size))
                    .await?;
                stamp_refreshed(&mut comments, self.env.now());
                Ok::<_, RemoteError>(Page::from_items(comments, request))
            },
            move |fetched: Page<Comment>| async move {
                persist_page(store, fetched.page, &fetched.items).await?;
                Ok::<_, SyncError>(())
            },
            move |_| async move {
                if remote_only {
                    return Ok(true);
                }
                let count = store.count_for_video(&check_id).await?;
                let oldest = store.oldest_refresh_for_video(&check_id).await?;
                let snapshot = FreshnessSnapshot::with_oldest(count, oldest);
                Ok::<_, LibraryError>(policy.is_stale(&snapshot, self.env.now()))
            },
        )
    }

    /// Drop cached comments of one video.
    pub async fn invalidate(&self, video_id: &str) -> core_library::Result<u64> {
        self.comments.clear_for_video(video_id).await
    }

    pub async fn invalidate_all(&self) -> core_library::Result<u64> {
        self.comments.clear().await
    }
}
