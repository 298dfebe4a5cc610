use actix_web::http::StatusCode;
use actix_web::{delete, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, RoleGuard};
use crate::error::AppError;
use crate::moderator::{ModeratorService, UpdateRoleRequest};
use crate::models::Role;
use crate::post::PostService;
use crate::response::ApiResponse;

/// Take a post down.
#[put(
    "/moderators/posts/{post_id}/status",
    wrap = "RoleGuard::new(&[Role::TakeDownPost])"
)]
pub async fn take_down_post(
    service: web::Data<PostService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let post_id = path.into_inner();
    log::info!("moderator {} taking down post {}", user.0.id, post_id);
    let changed = service.take_down(post_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(StatusCode::OK, changed)))
}

/// Grant roles to a user.
#[post("/moderators")]
pub async fn add_roles(
    service: web::Data<ModeratorService>,
    input: web::Json<UpdateRoleRequest>,
) -> Result<impl Responder, AppError> {
    let updated = service.add_roles(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(StatusCode::CREATED, updated)))
}

/// Revoke roles from a user.
#[delete("/moderators")]
pub async fn remove_roles(
    service: web::Data<ModeratorService>,
    input: web::Json<UpdateRoleRequest>,
) -> Result<impl Responder, AppError> {
    let updated = service.remove_roles(input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(StatusCode::OK, updated)))
}
