use actix_web::{error, http::StatusCode, web, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::friend::{FriendPatch, NewFriend};
use crate::friend_storage::{FriendStorage, StorageError};

const MAX_SIZE: usize = 102_400; // max payload size is 100k

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Friend not found")]
    NotFound,
    #[error("Internal server error")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::NotFound => HttpResponse::NotFound().json(Message { message: "Friend not found" }),
            ApiError::Internal(cause) => {
                log::error!("{}", cause);
                HttpResponse::InternalServerError().json(Message { message: "Internal server error" })
            }
        }
    }
}

fn parse_id(path: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(path).map_err(|err| ApiError::Internal(format!("invalid friend id {:?}: {}", path, err)))
}

fn empty_body<T: DeserializeOwned>() -> Result<T, ApiError> {
    serde_json::from_str("{}").map_err(|err| ApiError::Internal(format!("unable to parse json data: {}", err)))
}

/// Reads a JSON body. Bodies that are not `application/json`, and empty
/// bodies, are read as `{}`.
async fn read_json<T: DeserializeOwned>(req: &HttpRequest, mut payload: web::Payload) -> Result<T, ApiError> {
    if !req.content_type().eq_ignore_ascii_case("application/json") {
        log::debug!("Ignoring body with content type {:?}", req.content_type());
        return empty_body();
    }

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| ApiError::Internal(format!("unable to read payload: {}", err)))?;
        if (body.len() + chunk.len()) > MAX_SIZE {
            return Err(ApiError::Internal("payload data overflow".to_owned()));
        }
        body.extend_from_slice(&chunk);
    }

    if body.is_empty() {
        return empty_body();
    }

    serde_json::from_slice::<T>(&body).map_err(|err| ApiError::Internal(format!("unable to parse json data: {}", err)))
}

async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

async fn friend_list(storage: web::Data<dyn FriendStorage>) -> Result<HttpResponse, ApiError> {
    let friends = storage.list().await?;
    Ok(HttpResponse::Ok().json(friends))
}

async fn friend_get(storage: web::Data<dyn FriendStorage>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;

    match storage.get_by_id(&id).await? {
        Some(friend) => Ok(HttpResponse::Ok().json(friend)),
        None => Err(ApiError::NotFound),
    }
}

async fn friend_create(
    req: HttpRequest,
    storage: web::Data<dyn FriendStorage>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let new_friend = read_json::<NewFriend>(&req, payload).await?;

    let friend = storage.create(new_friend).await?;
    log::debug!("Friend {} created", friend.id);

    Ok(HttpResponse::Ok().json(friend))
}

async fn friend_delete(storage: web::Data<dyn FriendStorage>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;

    if !storage.delete(&id).await? {
        return Err(ApiError::NotFound);
    }
    log::debug!("Friend {} deleted", id);

    Ok(HttpResponse::Ok().json(Message { message: "Friend deleted successfully" }))
}

async fn friend_update(
    req: HttpRequest,
    storage: web::Data<dyn FriendStorage>,
    path: web::Path<String>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let patch = read_json::<FriendPatch>(&req, payload).await?;

    match storage.update(&id, patch).await? {
        Some(friend) => Ok(HttpResponse::Ok().json(friend)),
        None => Err(ApiError::NotFound),
    }
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(Message { message: "Not found" })
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Internal(format!("unable to extract path: {}", err)).into()
}

/// Registers the friend routes. Expects `web::Data<dyn FriendStorage>` in app data.
///
/// A method without a route answers 404. `DELETE` and `PATCH` on
/// `/favicon.ico` go to the id handlers like any other id.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::resource("/favicon.ico")
                .route(web::get().to(favicon))
                .route(web::delete().to(friend_delete))
                .route(web::patch().to(friend_update))
                .default_service(web::to(not_found)),
        )
        .service(
            web::resource("/")
                .route(web::get().to(friend_list))
                .route(web::post().to(friend_create))
                .default_service(web::to(not_found)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(friend_get))
                .route(web::delete().to(friend_delete))
                .route(web::patch().to(friend_update))
                .default_service(web::to(not_found)),
        )
        .default_service(web::to(not_found));
}
