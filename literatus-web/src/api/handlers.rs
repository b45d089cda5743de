//! HTTP request handlers
//!
//! Accounts, the profile/ratings view, the metadata search, and the three
//! classification-interview endpoints (add, compare, rerank) plus delete.
//! Everything ranking-related delegates to literatus-core; handlers own the
//! per-user pending-session map and the JSON shapes.

use crate::auth::{self, AuthUser, SESSION_COOKIE};
use crate::error::{Error, Result};
use crate::lookup::BookHit;
use crate::state::AppContext;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use literatus_core::ranking::{
    begin_classification, rating_for, resolver, submit_judgment, ClassificationStep, JudgmentStep,
    OperationKind, RatedBook,
};
use literatus_core::{Book, Error as CoreError, Tier};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    user_id: Uuid,
    username: String,
    profile_image: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    title: String,
    author: String,
    tier: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    competitor_id: Uuid,
    prefer_subject: bool,
}

/// One shelved book as shown on the profile
#[derive(Debug, Serialize)]
pub struct ShelfEntry {
    book_id: Uuid,
    title: String,
    author: String,
    position: i64,
    rating: f64,
    global_rank: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    username: String,
    profile_image: Option<String>,
    beloved: Vec<ShelfEntry>,
    tolerated: Vec<ShelfEntry>,
    disliked: Vec<ShelfEntry>,
}

/// The question the interview wants answered next
#[derive(Debug, Serialize)]
pub struct ComparisonInfo {
    competitor_id: Uuid,
    title: String,
    author: String,
}

/// Interview state after add/compare/rerank: either the next question
/// (`pending`) or the final placement (`complete`).
#[derive(Debug, Serialize)]
pub struct InterviewResponse {
    status: String,
    book_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<ComparisonInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
}

impl InterviewResponse {
    fn pending(book_id: Uuid, competitor: &Book) -> Self {
        Self {
            status: "pending".to_string(),
            book_id,
            comparison: Some(ComparisonInfo {
                competitor_id: competitor.id,
                title: competitor.title.clone(),
                author: competitor.author.clone(),
            }),
            position: None,
            rating: None,
        }
    }
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "literatus-web".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Account Endpoints
// ============================================================================

/// POST /register - Create a user account
pub async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(Error::BadRequest(
            "username and password must not be empty".to_string(),
        ));
    }

    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(username)
        .fetch_one(&ctx.db)
        .await?;
    if taken {
        return Err(Error::Conflict(format!("username '{}' already exists", username)));
    }

    let user_id = Uuid::new_v4();
    let profile_image = format!("https://api.dicebear.com/6.x/initials/svg?seed={}", username);
    sqlx::query(
        "INSERT INTO users (guid, username, password_hash, profile_image) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id.to_string())
    .bind(username)
    .bind(auth::hash_password(&req.password))
    .bind(&profile_image)
    .execute(&ctx.db)
    .await?;

    info!("Registered user {}", username);
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user_id,
            username: username.to_string(),
            profile_image,
        }),
    ))
}

/// POST /login - Verify credentials and issue a session cookie
pub async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserResponse>)> {
    let row: Option<(String, String, Option<String>)> = sqlx::query_as(
        "SELECT guid, password_hash, profile_image FROM users WHERE username = ?",
    )
    .bind(&req.username)
    .fetch_optional(&ctx.db)
    .await?;

    let (guid, password_hash, profile_image) = row.ok_or(Error::Unauthorized)?;
    if !auth::verify_password(&req.password, &password_hash) {
        return Err(Error::Unauthorized);
    }
    let user_id = Uuid::parse_str(&guid).map_err(|_| Error::Unauthorized)?;

    let token = auth::create_session(&ctx.db, user_id).await?;
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
            .parse()
            .map_err(|_| Error::BadRequest("invalid session token".to_string()))?,
    );

    info!("User {} logged in", req.username);
    Ok((
        headers,
        Json(UserResponse {
            user_id,
            username: req.username,
            profile_image: profile_image.unwrap_or_default(),
        }),
    ))
}

/// POST /logout - Drop the session and expire the cookie
pub async fn logout(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> Result<(HeaderMap, Json<StatusResponse>)> {
    auth::delete_session(&ctx.db, &user.token).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
            .parse()
            .map_err(|_| Error::BadRequest("invalid cookie header".to_string()))?,
    );

    Ok((
        headers,
        Json(StatusResponse {
            status: "logged out".to_string(),
        }),
    ))
}

// ============================================================================
// Shelf Views
// ============================================================================

/// GET /profile - The user's three tiers with derived ratings
pub async fn profile(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>> {
    let profile_image: Option<String> =
        sqlx::query_scalar("SELECT profile_image FROM users WHERE guid = ?")
            .bind(user.id.to_string())
            .fetch_one(&ctx.db)
            .await?;

    let rated = literatus_core::ranking::project_ratings(&ctx.store, user.id).await?;

    let mut response = ProfileResponse {
        username: user.username,
        profile_image,
        beloved: Vec::new(),
        tolerated: Vec::new(),
        disliked: Vec::new(),
    };
    for book in rated {
        let shelf = match book.tier {
            Tier::Beloved => &mut response.beloved,
            Tier::Tolerated => &mut response.tolerated,
            Tier::Disliked => &mut response.disliked,
        };
        shelf.push(shelf_entry(book));
    }

    Ok(Json(response))
}

fn shelf_entry(book: RatedBook) -> ShelfEntry {
    ShelfEntry {
        book_id: book.id,
        title: book.title,
        author: book.author,
        position: book.position,
        rating: book.rating,
        global_rank: book.global_rank,
    }
}

/// GET /search_books?query= - External metadata search
///
/// Lookup failures degrade to an empty candidate list rather than an error;
/// the shelf never depends on the external service being up.
pub async fn search_books(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<BookHit>> {
    let query = params.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Json(Vec::new());
    }

    match ctx.lookup.search(&query).await {
        Ok(hits) => Json(hits),
        Err(e) => {
            warn!("Book lookup failed for '{}': {}", query, e);
            Json(Vec::new())
        }
    }
}

// ============================================================================
// Classification Interview
// ============================================================================

/// POST /books - Add a book to a tier and start its placement interview
pub async fn add_book(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<AddBookRequest>,
) -> Result<Json<InterviewResponse>> {
    let tier = Tier::from_str(&req.tier)
        .ok_or_else(|| Error::BadRequest(format!("unknown tier '{}'", req.tier)))?;

    // One interview per user: a pending one is abandoned here.
    discard_pending(&ctx, user.id, None).await?;

    let book = ctx.store.add_book(user.id, &req.title, &req.author, tier).await?;
    let step = begin_classification(&ctx.store, user.id, book.id).await?;
    Ok(Json(interview_step(&ctx, user.id, book.id, step).await?))
}

/// POST /books/compare - Answer the outstanding pairwise question
pub async fn compare_books(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<CompareRequest>,
) -> Result<Json<InterviewResponse>> {
    let mut sessions = ctx.sessions.write().await;
    let session = sessions.get_mut(&user.id).ok_or_else(|| {
        Error::Core(CoreError::InvalidState("no interview in flight".to_string()))
    })?;
    let subject_id = session.subject_id();

    match submit_judgment(&ctx.store, &mut *session, req.competitor_id, req.prefer_subject).await {
        Ok(JudgmentStep::Pending(next)) => {
            let competitor = ctx.store.book(next.competitor_id).await?;
            Ok(Json(InterviewResponse::pending(subject_id, &competitor)))
        }
        Ok(JudgmentStep::Resolved(resolution)) => {
            sessions.remove(&user.id);
            drop(sessions);
            resolver::apply(&ctx.store, user.id, subject_id, resolution).await?;
            Ok(Json(complete_response(&ctx, user.id, subject_id).await?))
        }
        Err(e @ CoreError::InvalidState(_)) => {
            // Wrong competitor named: the question stands, the session stays.
            Err(e.into())
        }
        Err(e) => {
            // Stale interview (subject or competitor gone): abandon it.
            let was_insert = matches!(session.kind(), OperationKind::InsertNew);
            sessions.remove(&user.id);
            drop(sessions);
            if was_insert {
                if let Err(cleanup) =
                    resolver::discard_staged(&ctx.store, user.id, subject_id).await
                {
                    warn!("Could not discard staged subject {}: {}", subject_id, cleanup);
                }
            }
            Err(e.into())
        }
    }
}

/// POST /books/:book_id/rerank - Restart the interview for a ranked book
pub async fn rerank_book(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Path(book_id): Path<Uuid>,
) -> Result<Json<InterviewResponse>> {
    // Keep the subject if it is the staged book of the interview being
    // replaced: begin_classification below resumes its placement.
    discard_pending(&ctx, user.id, Some(book_id)).await?;

    let step = begin_classification(&ctx.store, user.id, book_id).await?;
    Ok(Json(interview_step(&ctx, user.id, book_id, step).await?))
}

/// DELETE /books/:book_id - Remove a book, closing the positional gap
pub async fn delete_book(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Path(book_id): Path<Uuid>,
) -> Result<Json<StatusResponse>> {
    // An interview about this book cannot outlive it.
    {
        let mut sessions = ctx.sessions.write().await;
        if sessions
            .get(&user.id)
            .is_some_and(|s| s.subject_id() == book_id)
        {
            sessions.remove(&user.id);
        }
    }

    resolver::delete(&ctx.store, user.id, book_id).await?;
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

// ============================================================================
// Interview Helpers
// ============================================================================

/// Handle the outcome of `begin_classification`: stash a pending session or
/// apply the immediate resolution.
async fn interview_step(
    ctx: &AppContext,
    user_id: Uuid,
    book_id: Uuid,
    step: ClassificationStep,
) -> Result<InterviewResponse> {
    match step {
        ClassificationStep::Resolved(resolution) => {
            resolver::apply(&ctx.store, user_id, book_id, resolution).await?;
            complete_response(ctx, user_id, book_id).await
        }
        ClassificationStep::Pending {
            session,
            comparison,
        } => {
            let competitor = ctx.store.book(comparison.competitor_id).await?;
            ctx.sessions.write().await.insert(user_id, session);
            Ok(InterviewResponse::pending(book_id, &competitor))
        }
    }
}

/// Final placement of a resolved interview, with the derived rating
async fn complete_response(
    ctx: &AppContext,
    user_id: Uuid,
    book_id: Uuid,
) -> Result<InterviewResponse> {
    let book = ctx.store.book(book_id).await?;
    let tier_size = ctx.store.books_in_tier(user_id, book.tier).await?.len() as i64;
    Ok(InterviewResponse {
        status: "complete".to_string(),
        book_id,
        comparison: None,
        position: Some(book.position),
        rating: Some(rating_for(book.tier, book.position, tier_size)),
    })
}

/// Drop the user's pending interview, discarding its staged subject unless
/// that subject is `keep` (about to be re-interviewed).
async fn discard_pending(ctx: &AppContext, user_id: Uuid, keep: Option<Uuid>) -> Result<()> {
    let removed = ctx.sessions.write().await.remove(&user_id);
    let Some(session) = removed else {
        return Ok(());
    };

    if matches!(session.kind(), OperationKind::InsertNew) && Some(session.subject_id()) != keep {
        match resolver::discard_staged(&ctx.store, user_id, session.subject_id()).await {
            Ok(()) => {}
            // Already gone or already ranked: nothing left to clean up.
            Err(CoreError::NotFound(_)) | Err(CoreError::InvalidState(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
