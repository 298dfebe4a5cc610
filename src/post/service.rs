use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::media::{ensure_image, ImageUploader};
use crate::models::post::{
    CreatePostRequest, LikeResponse, NewLike, NewPost, NewPostMedia, PostResponse,
    PostStatusResponse,
};
use crate::post::repository::PostRepository;

pub const UNSUPPORTED_MEDIA_MESSAGE: &str =
    "unsupported media file type. Only upload jpg or png file";

pub struct PostService {
    repo: Arc<dyn PostRepository>,
    uploader: Arc<dyn ImageUploader>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, uploader: Arc<dyn ImageUploader>) -> Self {
        Self { repo, uploader }
    }

    /// Every attachment is checked before any of them is uploaded.
    pub async fn create(
        &self,
        author: Uuid,
        input: CreatePostRequest,
    ) -> Result<PostResponse, AppError> {
        input.validate()?;
        let subforum_id = input.subforum_id.ok_or_else(|| {
            AppError::field("subforum_id", "subforum_id is required and must be a valid id")
        })?;

        for file in &input.media {
            ensure_image(file, UNSUPPORTED_MEDIA_MESSAGE)?;
        }

        let mut media = Vec::with_capacity(input.media.len());
        for file in &input.media {
            let media_url = self.uploader.upload(file).await.map_err(|e| {
                log::error!("post media upload failed: {}", e);
                AppError::InternalServerError("fail to create new post, failed to upload media file".into())
            })?;
            media.push(NewPostMedia {
                id: Uuid::now_v7(),
                media_url,
                created_at: Utc::now(),
            });
        }

        let post = self
            .repo
            .create(NewPost {
                id: Uuid::now_v7(),
                caption: input.caption,
                user_id: author,
                subforum_id,
                created_at: Utc::now(),
                media,
            })
            .await?;
        log::info!("user {} created post {} in {}", author, post.id, subforum_id);

        Ok(PostResponse { post })
    }

    pub async fn take_down(&self, post_id: Uuid) -> Result<PostStatusResponse, AppError> {
        let post = self.repo.take_down(post_id, Utc::now()).await?;
        log::info!("post {} taken down", post_id);
        Ok(PostStatusResponse { post })
    }

    pub async fn like(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeResponse, AppError> {
        let post = self
            .repo
            .like(NewLike {
                post_id,
                user_id,
                created_at: Utc::now(),
            })
            .await?;
        Ok(LikeResponse { post })
    }
}
