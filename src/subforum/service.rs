use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::media::{ensure_image, ImageUploader, UploadedFile};
use crate::models::subforum::{
    CreateSubforumRequest, SubforumDetail, SubforumListResponse, SubforumQuery, SubforumResponse,
};
use crate::models::Subforum;
use crate::subforum::repository::{SubforumRepository, SUBFORUM_NOT_FOUND_MESSAGE};

const UNSUPPORTED_ICON_MESSAGE: &str =
    "fail to create new subforum, unsupported icon file type. Only upload jpg or png file";
const UNSUPPORTED_BANNER_MESSAGE: &str =
    "fail to create new subforum, unsupported banner file type. Only upload jpg or png file";

pub struct SubforumService {
    repo: Arc<dyn SubforumRepository>,
    uploader: Arc<dyn ImageUploader>,
}

impl SubforumService {
    pub fn new(repo: Arc<dyn SubforumRepository>, uploader: Arc<dyn ImageUploader>) -> Self {
        Self { repo, uploader }
    }

    /// Checks both images, uploads them and stores the subforum owned by `owner`.
    pub async fn create(
        &self,
        owner: Uuid,
        input: CreateSubforumRequest,
    ) -> Result<SubforumResponse, AppError> {
        input.validate()?;
        let (icon, banner) = match (input.icon, input.banner) {
            (Some(icon), Some(banner)) => (icon, banner),
            (None, _) => return Err(AppError::field("icon", "icon is required")),
            (_, None) => return Err(AppError::field("banner", "banner is required")),
        };

        ensure_image(&icon, UNSUPPORTED_ICON_MESSAGE)?;
        ensure_image(&banner, UNSUPPORTED_BANNER_MESSAGE)?;

        let icon_url = self.upload(&icon, "icon").await?;
        let banner_url = self.upload(&banner, "banner").await?;

        let subforum = self
            .repo
            .create(Subforum {
                id: Uuid::now_v7(),
                name: input.name,
                description: input.description,
                user_id: owner,
                icon: icon_url,
                banner: banner_url,
                created_at: Utc::now(),
            })
            .await?;
        log::info!("user {} created subforum {}", owner, subforum.id);

        Ok(SubforumResponse {
            subforum: subforum.into(),
        })
    }

    async fn upload(&self, file: &UploadedFile, what: &str) -> Result<String, AppError> {
        self.uploader.upload(file).await.map_err(|e| {
            log::error!("subforum {} upload failed: {}", what, e);
            AppError::InternalServerError(format!(
                "fail to create new subforum, failed to upload {} file",
                what
            ))
        })
    }

    pub async fn find_by_name(&self, query: SubforumQuery) -> Result<SubforumListResponse, AppError> {
        query.validate()?;
        let subforums = self.repo.find_by_name(&query.name).await?;

        Ok(SubforumListResponse {
            subforums: subforums.into_iter().map(SubforumDetail::from).collect(),
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<SubforumResponse, AppError> {
        let subforum = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBFORUM_NOT_FOUND_MESSAGE.into()))?;

        Ok(SubforumResponse {
            subforum: subforum.into(),
        })
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_owned(id, owner).await?;
        log::info!("user {} deleted subforum {}", owner, id);
        Ok(())
    }
}
