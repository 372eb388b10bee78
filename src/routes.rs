use std::convert::Infallible;

use percent_encoding::percent_decode_str;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use warp::{
    cors::CorsForbidden,
    filters::body::BodyDeserializeError,
    http::header::{HeaderMap, AUTHORIZATION},
    hyper::{body::Bytes, StatusCode},
    path,
    reject::{
        InvalidHeader, LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType,
    },
    reply, Filter, Rejection, Reply,
};

use crate::{
    auth::{hash_password, verify_password},
    case_insensitive_string_ext::CaseInsensitiveStrExt,
    catalog,
    error::BookstoreError,
    policy,
    state::Bookstore,
    types::{Isbn, Reviews, User, Username},
};

const MAX_BODY_BYTES: u64 = 16 * 1024;

// warp cannot reflect arbitrary request headers, so allow the ones browsers and
// common HTTP clients send
const CORS_ALLOWED_HEADERS: [&str; 12] = [
    "accept",
    "accept-language",
    "authorization",
    "cache-control",
    "content-language",
    "content-type",
    "if-match",
    "if-none-match",
    "origin",
    "pragma",
    "x-requested-with",
    "x-csrf-token",
];

/// Every public and protected route, without rejection handling.
pub fn build_api_route_filter(
    store: &Bookstore,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let health = warp::path::end()
        .and(warp::get())
        .map(|| "Book Store API is running");

    let all_books = path!("books")
        .and(warp::get())
        .and(with_state(store.clone()))
        .and_then(list_books);

    let by_isbn = path!("books" / "isbn" / String)
        .and(warp::get())
        .and(with_state(store.clone()))
        .and_then(book_by_isbn);

    let by_author = path!("books" / "author" / String)
        .and(warp::get())
        .and(with_state(store.clone()))
        .and_then(books_by_author);

    let by_title = path!("books" / "title" / String)
        .and(warp::get())
        .and(with_state(store.clone()))
        .and_then(books_by_title);

    let reviews = path!("books" / String / "review")
        .and(warp::get())
        .and(with_state(store.clone()))
        .and_then(book_reviews);

    let register = path!("register")
        .and(warp::post())
        .and(json_body())
        .and(with_state(store.clone()))
        .and_then(user_register);

    let login = path!("login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(store.clone()))
        .and_then(user_login);

    let put_review = path!("auth" / "review" / String)
        .and(warp::put())
        .and(with_auth(store))
        .and(lenient_json_body())
        .and(with_state(store.clone()))
        .and_then(review_put);

    let delete_review = path!("auth" / "review" / String)
        .and(warp::delete())
        .and(with_auth(store))
        .and(with_state(store.clone()))
        .and_then(review_delete);

    health
        .or(all_books)
        .or(by_isbn)
        .or(by_author)
        .or(by_title)
        .or(reviews)
        .or(register)
        .or(login)
        .or(put_review)
        .or(delete_review)
}

/// The full service: routes plus CORS, JSON error rendering and request tracing.
pub fn build_service(
    store: &Bookstore,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(CORS_ALLOWED_HEADERS)
        .allow_methods(["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE"]);

    // error replies are rendered inside the CORS layer so they carry its headers;
    // the outer recover only sees rejected preflights
    build_api_route_filter(store)
        .recover(handle_rejection)
        .with(cors)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// Gate for protected routes: yields the username carried by a valid bearer token.
pub fn with_auth(store: &Bookstore) -> impl Filter<Extract = (Username,), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and(with_state(store.clone()))
        .and_then(user_auth_check)
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(error) = err.find::<BookstoreError>() {
        if error.status().is_server_error() {
            tracing::error!(error = ?error, "request failed");
        }
        (error.status(), error.public_message())
    } else if let Some(error) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, error.to_string())
    } else if let Some(error) = err.find::<CorsForbidden>() {
        (StatusCode::FORBIDDEN, error.to_string())
    } else if let Some(error) = err.find::<InvalidHeader>() {
        (StatusCode::BAD_REQUEST, error.to_string())
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".into())
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "content-length required".into())
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected a JSON body".into(),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".into())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".into())
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "an unknown error has occurred".into(),
        )
    };

    Ok(reply::with_status(
        reply::json(&ErrorResponse { error: message }),
        status,
    ))
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub message: &'static str,
    pub reviews: Reviews,
}

async fn list_books(store: Bookstore) -> Result<impl Reply, Rejection> {
    let books = store
        .catalog
        .lock()
        .await
        .list_books()
        .await
        .map_err(BookstoreError::from)?;

    Ok(reply::json(&books))
}

async fn book_by_isbn(isbn: String, store: Bookstore) -> Result<impl Reply, Rejection> {
    let isbn = Isbn(decode_segment(&isbn));
    let guard = store.catalog.lock().await;
    let book = catalog::by_isbn(&*guard, &isbn).await?;

    Ok(reply::json(&book))
}

async fn books_by_author(author: String, store: Bookstore) -> Result<impl Reply, Rejection> {
    let guard = store.catalog.lock().await;
    let books = catalog::by_author(&*guard, &decode_segment(&author)).await?;

    Ok(reply::json(&books))
}

async fn books_by_title(title: String, store: Bookstore) -> Result<impl Reply, Rejection> {
    let guard = store.catalog.lock().await;
    let books = catalog::by_title(&*guard, &decode_segment(&title)).await?;

    Ok(reply::json(&books))
}

async fn book_reviews(isbn: String, store: Bookstore) -> Result<impl Reply, Rejection> {
    let isbn = Isbn(decode_segment(&isbn));
    let guard = store.catalog.lock().await;
    let reviews = catalog::reviews_for(&*guard, &isbn).await?;

    Ok(reply::json(&reviews))
}

#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsQuery {
    fn into_parts(self) -> Option<(Username, String)> {
        let username = self.username.filter(|u| !u.is_empty())?;
        let password = self.password.filter(|p| !p.is_empty())?;
        Some((Username(username), password))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

async fn user_register(input: CredentialsQuery, store: Bookstore) -> Result<impl Reply, Rejection> {
    let (username, password) = input
        .into_parts()
        .ok_or(BookstoreError::InvalidInput("username and password required"))?;

    let hashed_password = hash_password(&password).await?;
    let user = User {
        username,
        hashed_password,
    };

    let created = store
        .credentials
        .lock()
        .await
        .create_user_if_not_exists(&user)
        .await
        .map_err(BookstoreError::from)?;

    if !created {
        tracing::info!(username = %user.username, "registration rejected, username taken");
        Err(BookstoreError::Conflict)?;
    }

    tracing::info!(username = %user.username, "user registered");

    Ok(reply::with_status(
        reply::json(&MessageResponse {
            message: "User registered",
        }),
        StatusCode::CREATED,
    ))
}

async fn user_login(input: CredentialsQuery, store: Bookstore) -> Result<impl Reply, Rejection> {
    let (username, password) = input
        .into_parts()
        .ok_or(BookstoreError::INVALID_CREDENTIALS)?;

    let stored = store
        .credentials
        .lock()
        .await
        .retrieve_user(&username)
        .await
        .map_err(BookstoreError::from)?;

    let verified = match stored {
        Some(hashed_password) => verify_password(&password, &hashed_password).await?,
        None => {
            // spend the same hashing effort as a real check
            hash_password(&password).await?;
            false
        }
    };

    if !verified {
        tracing::info!(username = %username, "login failed");
        Err(BookstoreError::INVALID_CREDENTIALS)?;
    }

    let token = store.tokens.issue(&username)?;
    tracing::info!(username = %username, "login succeeded");

    Ok(reply::json(&LoginResponse { token }))
}

/// Review body as sent by the client. `review` is left untyped so that a
/// non-string value fails the same way as a blank one, after the book lookup.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    #[serde(default)]
    pub review: Option<serde_json::Value>,
}

async fn review_put(
    isbn: String,
    username: Username,
    input: ReviewQuery,
    store: Bookstore,
) -> Result<impl Reply, Rejection> {
    let isbn = Isbn(decode_segment(&isbn));
    let mut guard = store.catalog.lock().await;
    let text = input.review.as_ref().and_then(serde_json::Value::as_str);
    let reviews = policy::submit(&mut *guard, &isbn, &username, text).await?;
    drop(guard);

    tracing::info!(%isbn, %username, "review saved");

    Ok(reply::json(&ReviewsResponse {
        message: "Review saved",
        reviews,
    }))
}

async fn review_delete(
    isbn: String,
    username: Username,
    store: Bookstore,
) -> Result<impl Reply, Rejection> {
    let isbn = Isbn(decode_segment(&isbn));
    let mut guard = store.catalog.lock().await;
    let reviews = policy::remove(&mut *guard, &isbn, &username).await?;
    drop(guard);

    tracing::info!(%isbn, %username, "review deleted");

    Ok(reply::json(&ReviewsResponse {
        message: "Review deleted",
        reviews,
    }))
}

// Unwrap the bearer token and validate it
async fn user_auth_check(headers: HeaderMap, store: Bookstore) -> Result<Username, Rejection> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(BookstoreError::MISSING_TOKEN)?;

    let username = store.tokens.verify(token)?;

    Ok(username)
}

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix_ignore_ascii_case("bearer ")
        .filter(|token| !token.is_empty())
}

fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// JSON body that never rejects on shape: a missing, empty or malformed body
/// yields `T::default()`. Declared lengths over the limit are still refused.
fn lenient_json_body<T: DeserializeOwned + Default + Send + 'static>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    let declared = warp::body::content_length_limit(MAX_BODY_BYTES)
        .and(warp::body::bytes())
        .map(|body: Bytes| serde_json::from_slice::<T>(&body).unwrap_or_default());

    let absent = warp::header::optional::<String>("content-length")
        .and_then(|length: Option<String>| async move {
            match length {
                None => Ok(()),
                Some(_) => Err(warp::reject::not_found()),
            }
        })
        .untuple_one()
        .map(T::default);

    declared.or(absent).unify()
}

// functor that adds a clone of the shared service state into the filter chain
fn with_state(store: Bookstore) -> impl Filter<Extract = (Bookstore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}
