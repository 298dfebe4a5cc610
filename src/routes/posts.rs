use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::media::MultipartForm;
use crate::models::post::{CreatePostRequest, MAX_POST_MEDIA};
use crate::post::PostService;
use crate::response::ApiResponse;

/// Create a post from a multipart form with `caption`, `subforum_id` and
/// one to ten `post_media` images.
#[post("/posts")]
pub async fn create_post(
    service: web::Data<PostService>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = MultipartForm::read(payload, MAX_POST_MEDIA).await?;
    let input = CreatePostRequest {
        caption: form.text("caption"),
        // an unparsable id is reported the same way as a missing one
        subforum_id: Uuid::parse_str(&form.text("subforum_id")).ok(),
        media: form.take_files("post_media"),
    };

    let created = service.create(user.0.id, input).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(StatusCode::CREATED, created)))
}

#[post("/posts/{id}/likes")]
pub async fn like_post(
    service: web::Data<PostService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let liked = service.like(user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(StatusCode::CREATED, liked)))
}
