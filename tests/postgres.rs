//! Repository tests against a real Postgres. Ignored by default; run them with
//! `DATABASE_URL` set and `cargo test --test postgres -- --ignored`.

use chrono::Utc;
use dotenv::dotenv;
use sqlx::PgPool;
use uuid::Uuid;

use code_roast::auth::{hash_password, AuthRepository, PgAuthRepository};
use code_roast::db;
use code_roast::error::AppError;
use code_roast::moderator::{ModeratorRepository, PgModeratorRepository};
use code_roast::models::post::{NewLike, NewPost, NewPostMedia};
use code_roast::models::user::{NewSession, NewUser};
use code_roast::models::{PostStatus, Role, Subforum};
use code_roast::post::{PgPostRepository, PostRepository};
use code_roast::subforum::{PgSubforumRepository, SubforumRepository};

async fn pool() -> PgPool {
    dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for the postgres tests");
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test DB");
    db::migrate(&pool).await.expect("migrations apply");
    pool
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::now_v7())
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        id: Uuid::now_v7(),
        fullname: "Postgres Test".into(),
        email: email.into(),
        password_hash: hash_password("pw123456").unwrap(),
        created_at: Utc::now(),
    }
}

fn new_session() -> NewSession {
    NewSession {
        id: Uuid::now_v7(),
        refresh_token: Uuid::now_v7().to_string(),
        last_login: Utc::now(),
        remote_ip: "127.0.0.1".into(),
        agent: "postgres-test".into(),
    }
}

async fn count(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_rt::test]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_registration_is_atomic() {
    let pool = pool().await;
    let repo = PgAuthRepository::new(pool.clone());
    let email = unique_email();

    let first = new_user(&email);
    let created = repo.register(first.clone(), new_session()).await.unwrap();
    assert_eq!(created.roles, vec![Role::Member.record()]);

    let second = new_user(&email);
    let err = repo.register(second.clone(), new_session()).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{:?}", err);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users WHERE id = $1", second.id).await, 0);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM user_roles WHERE user_id = $1", second.id).await,
        0
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM authentication WHERE user_id = $1", first.id).await,
        1
    );
}

#[actix_rt::test]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_refresh_token_collision_rolls_back_user() {
    let pool = pool().await;
    let repo = PgAuthRepository::new(pool.clone());

    let session = new_session();
    repo.register(new_user(&unique_email()), session.clone())
        .await
        .unwrap();

    let user = new_user(&unique_email());
    let err = repo.register(user.clone(), session).await.unwrap_err();
    assert_eq!(err.public_message(), "fail to process your request, please try again");
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users WHERE id = $1", user.id).await, 0);
}

#[actix_rt::test]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_login_lookup_and_session_record() {
    let pool = pool().await;
    let repo = PgAuthRepository::new(pool.clone());
    let email = unique_email();
    let user = new_user(&email);
    repo.register(user.clone(), new_session()).await.unwrap();

    assert!(repo.find_credentials(&unique_email()).await.unwrap().is_none());
    let credentials = repo.find_credentials(&email).await.unwrap().unwrap();
    assert_eq!(credentials.id, user.id);
    assert_eq!(credentials.password, user.password_hash);

    let sql = "SELECT COUNT(*) FROM authentication WHERE user_id = $1";
    assert_eq!(count(&pool, sql, user.id).await, 1);

    let session = new_session();
    let signed_in = repo.record_login(credentials, session.clone()).await.unwrap();
    assert_eq!(signed_in.id, user.id);
    assert_eq!(signed_in.roles, vec![Role::Member.record()]);
    assert_eq!(count(&pool, sql, user.id).await, 2);

    let found = repo
        .find_by_refresh_token(&session.refresh_token)
        .await
        .unwrap();
    assert_eq!(found.id, user.id);
}

#[actix_rt::test]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_role_removal_is_all_or_nothing() {
    let pool = pool().await;
    let auth = PgAuthRepository::new(pool.clone());
    let moderators = PgModeratorRepository::new(pool.clone());
    let user = new_user(&unique_email());
    auth.register(user.clone(), new_session()).await.unwrap();

    let roles = moderators.add_roles(user.id, &[5, 7]).await.unwrap();
    assert_eq!(roles.len(), 3);

    let err = moderators.add_roles(user.id, &[7]).await.unwrap_err();
    assert_eq!(err.public_message(), "this user already has that role");
    let err = moderators.add_roles(user.id, &[99]).await.unwrap_err();
    assert_eq!(err.public_message(), "user or role not found");

    let err = moderators.remove_roles(user.id, &[7, 1]).await.unwrap_err();
    assert_eq!(err.public_message(), "role not found for this user");
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM user_roles WHERE user_id = $1", user.id).await,
        3
    );

    let remaining = moderators.remove_roles(user.id, &[5, 7]).await.unwrap();
    assert_eq!(remaining, vec![Role::Member.record()]);
}

#[actix_rt::test]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_posts_likes_and_take_down() {
    let pool = pool().await;
    let auth = PgAuthRepository::new(pool.clone());
    let subforums = PgSubforumRepository::new(pool.clone());
    let posts = PgPostRepository::new(pool.clone());

    let user = new_user(&unique_email());
    auth.register(user.clone(), new_session()).await.unwrap();
    let subforum = subforums
        .create(Subforum {
            id: Uuid::now_v7(),
            name: format!("pg-{}", Uuid::now_v7()),
            description: "postgres test".into(),
            user_id: user.id,
            icon: "https://images.test/icon.png".into(),
            banner: "https://images.test/banner.png".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let media = |url: &str| NewPostMedia {
        id: Uuid::now_v7(),
        media_url: url.into(),
        created_at: Utc::now(),
    };
    let post = posts
        .create(NewPost {
            id: Uuid::now_v7(),
            caption: "hello".into(),
            user_id: user.id,
            subforum_id: subforum.id,
            created_at: Utc::now(),
            media: vec![media("https://images.test/1.png"), media("https://images.test/2.png")],
        })
        .await
        .unwrap();
    assert_eq!(post.media.len(), 2);
    assert_eq!(post.subforum.name, subforum.name);
    assert_eq!(post.status, PostStatus::Published);

    let orphan = posts
        .create(NewPost {
            id: Uuid::now_v7(),
            caption: "lost".into(),
            user_id: user.id,
            subforum_id: Uuid::now_v7(),
            created_at: Utc::now(),
            media: vec![media("https://images.test/3.png")],
        })
        .await
        .unwrap_err();
    assert!(matches!(orphan, AppError::BadRequest(_)));

    let like = || NewLike {
        post_id: post.id,
        user_id: user.id,
        created_at: Utc::now(),
    };
    assert_eq!(posts.like(like()).await.unwrap().like_count, 1);
    let err = posts.like(like()).await.unwrap_err();
    assert_eq!(err.public_message(), "you already liked this post");
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM likes WHERE post_id = $1", post.id).await,
        1
    );

    let changed = posts.take_down(post.id, Utc::now()).await.unwrap();
    assert_eq!(changed.status, PostStatus::TakeDown);
    assert!(matches!(
        posts.take_down(Uuid::now_v7(), Utc::now()).await,
        Err(AppError::NotFound(_))
    ));

    assert!(matches!(
        subforums.delete_owned(subforum.id, Uuid::now_v7()).await,
        Err(AppError::NotFound(_))
    ));
    subforums.delete_owned(subforum.id, user.id).await.unwrap();
}
