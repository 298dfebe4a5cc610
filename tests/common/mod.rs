//! Shared fixtures: an in-memory store behind every repository trait, a stub
//! image host and helpers for driving the app through `actix_web::test`.
#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::test;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::{json, Value};
use uuid::Uuid;

use code_roast::auth::repository::{DUPLICATE_EMAIL_MESSAGE, REFRESH_TOKEN_NOT_FOUND_MESSAGE};
use code_roast::auth::{AuthRepository, TokenIssuer};
use code_roast::error::AppError;
use code_roast::media::{ImageUploader, UploadedFile};
use code_roast::moderator::repository::{
    DUPLICATE_ROLE_MESSAGE, ROLE_NOT_ASSIGNED_MESSAGE, UNKNOWN_USER_OR_ROLE_MESSAGE,
};
use code_roast::moderator::ModeratorRepository;
use code_roast::models::post::{
    LikeCount, NewLike, NewPost, PostAuthor, PostStatusChange, PostSubforum,
};
use code_roast::models::user::{NewSession, NewUser, UserCredentials};
use code_roast::models::{PostDetail, PostStatus, PublicUser, Role, RoleRecord, Subforum};
use code_roast::post::repository::{
    DUPLICATE_LIKE_MESSAGE, POST_NOT_FOUND_MESSAGE, UNKNOWN_SUBFORUM_MESSAGE,
};
use code_roast::post::PostRepository;
use code_roast::subforum::repository::SUBFORUM_NOT_FOUND_MESSAGE;
use code_roast::subforum::SubforumRepository;
use code_roast::{AppState, Repositories};

pub const TEST_SECRET: &str = "integration-test-secret";

#[derive(Default)]
pub struct State {
    pub users: Vec<UserCredentials>,
    pub sessions: Vec<(Uuid, NewSession)>,
    pub user_roles: BTreeSet<(Uuid, i32)>,
    pub subforums: Vec<Subforum>,
    pub posts: Vec<PostDetail>,
    pub likes: HashSet<(Uuid, Uuid)>,
}

impl State {
    fn roles_of(&self, user_id: Uuid) -> Vec<RoleRecord> {
        self.user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| Role::from_id(*r))
            .map(Role::record)
            .collect()
    }

    fn public(&self, credentials: &UserCredentials) -> PublicUser {
        PublicUser {
            id: credentials.id,
            email: credentials.email.clone(),
            fullname: credentials.fullname.clone(),
            roles: self.roles_of(credentials.id),
        }
    }
}

/// Every repository at once, over one shared state. Multi-step writes work on
/// a copy and swap it in on success, mirroring a transaction.
#[derive(Default)]
pub struct MemoryStore {
    pub state: Mutex<State>,
}

impl MemoryStore {
    pub fn grant(&self, user_id: Uuid, role: Role) {
        self.state.lock().unwrap().user_roles.insert((user_id, role.id()));
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }
}

#[async_trait]
impl AuthRepository for MemoryStore {
    async fn register(&self, user: NewUser, session: NewSession) -> Result<PublicUser, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest(DUPLICATE_EMAIL_MESSAGE.into()));
        }
        let credentials = UserCredentials {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            password: user.password_hash,
        };
        state.sessions.push((credentials.id, session));
        state.user_roles.insert((credentials.id, Role::Member.id()));
        state.users.push(credentials.clone());
        Ok(state.public(&credentials))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn record_login(
        &self,
        user: UserCredentials,
        session: NewSession,
    ) -> Result<PublicUser, AppError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.push((user.id, session));
        Ok(state.public(&user))
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<PublicUser, AppError> {
        let state = self.state.lock().unwrap();
        state
            .sessions
            .iter()
            .find(|(_, s)| s.refresh_token == refresh_token)
            .and_then(|(user_id, _)| state.users.iter().find(|u| u.id == *user_id))
            .map(|credentials| state.public(credentials))
            .ok_or_else(|| AppError::Unauthorized(REFRESH_TOKEN_NOT_FOUND_MESSAGE.into()))
    }
}

#[async_trait]
impl ModeratorRepository for MemoryStore {
    async fn add_roles(&self, user_id: Uuid, role_ids: &[i32]) -> Result<Vec<RoleRecord>, AppError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::BadRequest(UNKNOWN_USER_OR_ROLE_MESSAGE.into()));
        }
        let mut next = state.user_roles.clone();
        for role_id in role_ids {
            if Role::from_id(*role_id).is_none() {
                return Err(AppError::BadRequest(UNKNOWN_USER_OR_ROLE_MESSAGE.into()));
            }
            if !next.insert((user_id, *role_id)) {
                return Err(AppError::BadRequest(DUPLICATE_ROLE_MESSAGE.into()));
            }
        }
        state.user_roles = next;
        Ok(state.roles_of(user_id))
    }

    async fn remove_roles(
        &self,
        user_id: Uuid,
        role_ids: &[i32],
    ) -> Result<Vec<RoleRecord>, AppError> {
        let mut state = self.state.lock().unwrap();
        let mut next = state.user_roles.clone();
        for role_id in role_ids {
            if !next.remove(&(user_id, *role_id)) {
                return Err(AppError::BadRequest(ROLE_NOT_ASSIGNED_MESSAGE.into()));
            }
        }
        state.user_roles = next;
        Ok(state.roles_of(user_id))
    }
}

#[async_trait]
impl SubforumRepository for MemoryStore {
    async fn create(&self, subforum: Subforum) -> Result<Subforum, AppError> {
        self.state.lock().unwrap().subforums.push(subforum.clone());
        Ok(subforum)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Subforum>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .subforums
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subforum>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.subforums.iter().find(|s| s.id == id).cloned())
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let before = state.subforums.len();
        state
            .subforums
            .retain(|s| !(s.id == id && s.user_id == user_id));
        if state.subforums.len() == before {
            return Err(AppError::NotFound(SUBFORUM_NOT_FOUND_MESSAGE.into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<PostDetail, AppError> {
        let mut state = self.state.lock().unwrap();
        let subforum = state
            .subforums
            .iter()
            .find(|s| s.id == post.subforum_id)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(UNKNOWN_SUBFORUM_MESSAGE.into()))?;
        let fullname = state
            .users
            .iter()
            .find(|u| u.id == post.user_id)
            .map(|u| u.fullname.clone())
            .unwrap_or_default();

        let detail = PostDetail {
            id: post.id,
            caption: post.caption,
            status: PostStatus::Published,
            media: post.media.into_iter().map(|m| m.media_url).collect(),
            created_at: post.created_at,
            updated_at: None,
            user: PostAuthor {
                id: post.user_id,
                fullname,
            },
            subforum: PostSubforum {
                id: subforum.id,
                name: subforum.name,
            },
        };
        state.posts.push(detail.clone());
        Ok(detail)
    }

    async fn take_down(&self, id: Uuid, at: DateTime<Utc>) -> Result<PostStatusChange, AppError> {
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND_MESSAGE.into()))?;
        post.status = PostStatus::TakeDown;
        post.updated_at = Some(at);
        Ok(PostStatusChange {
            id,
            status: PostStatus::TakeDown,
            updated_at: at,
        })
    }

    async fn like(&self, like: NewLike) -> Result<LikeCount, AppError> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.iter().any(|p| p.id == like.post_id) {
            return Err(AppError::NotFound(POST_NOT_FOUND_MESSAGE.into()));
        }
        if !state.likes.insert((like.post_id, like.user_id)) {
            return Err(AppError::BadRequest(DUPLICATE_LIKE_MESSAGE.into()));
        }
        let like_count = state.likes.iter().filter(|(p, _)| *p == like.post_id).count() as i64;
        Ok(LikeCount {
            id: like.post_id,
            like_count,
        })
    }
}

/// Hands out predictable URLs instead of talking to an image host.
pub struct StubUploader;

#[async_trait]
impl ImageUploader for StubUploader {
    async fn upload(&self, file: &UploadedFile) -> Result<String, AppError> {
        Ok(format!(
            "https://images.test/{}",
            file.filename.as_deref().unwrap_or("upload")
        ))
    }
}

pub fn state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let repos = Repositories {
        auth: store.clone(),
        moderators: store.clone(),
        subforums: store.clone(),
        posts: store.clone(),
    };
    let state = AppState::new(TokenIssuer::new(TEST_SECRET), repos, Arc::new(StubUploader));
    (state, store)
}

pub fn png() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([10, 120, 200])));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

const BOUNDARY: &str = "code-roast-test-boundary";

/// Builds a `multipart/form-data` body. Returns the content type and the body.
pub fn multipart(texts: &[(&str, &str)], files: &[(&str, &str, Vec<u8>)]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// A signed-in user as seen by the client.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// Calls the app and returns the status with the parsed JSON body.
pub async fn call<S, B>(app: &S, req: Request) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "response was not JSON. Body: {:?}",
            String::from_utf8_lossy(&body)
        )
    });
    (status, json)
}

pub async fn signup<S, B>(app: &S, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/signup")
        .set_json(json!({
            "fullname": "Test User",
            "email": email,
            "password": "pw123456",
            "password_confirmation": "pw123456"
        }))
        .to_request();
    let (status, body) = call(app, req).await;
    assert_eq!(status, 201, "signup failed. Body: {}", body);

    Session {
        user_id: body["data"]["user"]["id"].as_str().unwrap().parse().unwrap(),
        access_token: body["data"]["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["data"]["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Exchanges the session's refresh token for a new access token, picking up
/// any roles granted since sign-in.
pub async fn refresh<S, B>(app: &S, session: &Session) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::get()
        .uri("/api/v1/refresh")
        .cookie(Cookie::new("refresh_token", session.refresh_token.clone()))
        .to_request();
    let (status, body) = call(app, req).await;
    assert_eq!(status, 200, "refresh failed. Body: {}", body);

    Session {
        access_token: body["data"]["access_token"].as_str().unwrap().to_string(),
        ..session.clone()
    }
}
