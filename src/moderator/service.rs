use std::sync::Arc;

use validator::Validate;

use crate::error::AppError;
use crate::moderator::repository::ModeratorRepository;
use crate::moderator::{UpdateRoleRequest, UpdateRoleResponse, UserRoles};

pub struct ModeratorService {
    repo: Arc<dyn ModeratorRepository>,
}

impl ModeratorService {
    pub fn new(repo: Arc<dyn ModeratorRepository>) -> Self {
        Self { repo }
    }

    pub async fn add_roles(&self, input: UpdateRoleRequest) -> Result<UpdateRoleResponse, AppError> {
        input.validate()?;
        let user_id = input
            .user_id
            .ok_or_else(|| AppError::field("user_id", "user_id is required"))?;

        let roles = self.repo.add_roles(user_id, &input.role_id).await?;
        log::info!("granted roles {:?} to user {}", input.role_id, user_id);

        Ok(UpdateRoleResponse {
            user: UserRoles { id: user_id, roles },
        })
    }

    pub async fn remove_roles(
        &self,
        input: UpdateRoleRequest,
    ) -> Result<UpdateRoleResponse, AppError> {
        input.validate()?;
        let user_id = input
            .user_id
            .ok_or_else(|| AppError::field("user_id", "user_id is required"))?;

        let roles = self.repo.remove_roles(user_id, &input.role_id).await?;
        log::info!("revoked roles {:?} from user {}", input.role_id, user_id);

        Ok(UpdateRoleResponse {
            user: UserRoles { id: user_id, roles },
        })
    }
}
