use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, RoleGuard};
use crate::error::AppError;
use crate::media::MultipartForm;
use crate::models::subforum::{CreateSubforumRequest, SubforumQuery};
use crate::models::Role;
use crate::response::ApiResponse;
use crate::subforum::SubforumService;

/// A subforum form carries an icon and a banner.
const SUBFORUM_IMAGES: usize = 2;

/// Create a subforum from a multipart form with `name`, `description`, `icon` and `banner`.
#[post("/subforums", wrap = "RoleGuard::new(&[Role::CreateSubforum])")]
pub async fn create_subforum(
    service: web::Data<SubforumService>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = MultipartForm::read(payload, SUBFORUM_IMAGES).await?;
    let input = CreateSubforumRequest {
        name: form.text("name"),
        description: form.text("description"),
        icon: form.take_file("icon"),
        banner: form.take_file("banner"),
    };

    let created = service.create(user.0.id, input).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(StatusCode::CREATED, created)))
}

/// Subforums whose name matches `?name=`.
#[get("/subforums")]
pub async fn find_subforums(
    service: web::Data<SubforumService>,
    query: web::Query<SubforumQuery>,
) -> Result<impl Responder, AppError> {
    let found = service.find_by_name(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(StatusCode::OK, found)))
}

#[get("/subforums/{id}")]
pub async fn find_subforum(
    service: web::Data<SubforumService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let found = service.find_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(StatusCode::OK, found)))
}

/// Delete one of the caller's own subforums.
#[delete("/subforums/{id}", wrap = "RoleGuard::new(&[Role::DeleteSubforum])")]
pub async fn delete_subforum(
    service: web::Data<SubforumService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    service.delete(user.0.id, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        json!({ "subforum": { "id": id } }),
    )))
}
