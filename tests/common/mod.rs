#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, TypedHeader};
use serde_json::{json, Value};

use shelf::clients::library_client::{BookApi, LibraryClient};
use shelf::models::auth::SignupForm;
use shelf::models::book::{Book, BookFields, BookId};
use shelf::models::errors::ApiError;
use shelf::session::SessionStore;

pub const TOKEN: &str = "test-token";
pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";

type Reply = (StatusCode, Json<Value>);

/// In-process stand-in for the library REST server.
pub struct MockLibrary {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

pub struct MockState {
    books: Mutex<Vec<Value>>,
    users: Mutex<Vec<(String, String)>>,
    next_id: AtomicU64,
    hits: AtomicUsize,
}

impl MockLibrary {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            books: Mutex::new(Vec::new()),
            users: Mutex::new(vec![(EMAIL.to_string(), PASSWORD.to_string())]),
            next_id: AtomicU64::new(1),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/books", get(list_books).post(create_book))
            .route("/api/books/:id", get(get_book).put(update_book).delete(delete_book))
            .with_state(state.clone());

        let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
            .serve(app.into_make_service());
        let addr = server.local_addr();
        tokio::spawn(server);

        Self { addr, state }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn client(&self, session: Arc<dyn SessionStore>) -> LibraryClient {
        LibraryClient::new(reqwest::Client::new(), self.api_url(), session)
    }

    pub fn seed(&self, title: &str, author: &str, year: Option<i32>) -> u64 {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        self.state.books.lock().unwrap().push(json!({
            "id": id, "title": title, "author": author, "year": year, "genre": null, "description": null,
        }));
        id
    }

    pub fn titles(&self) -> Vec<String> {
        self.state.books.lock().unwrap().iter()
            .map(|book| book["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Number of requests the server has seen.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

fn message(status: StatusCode, text: &str) -> Reply {
    (status, Json(json!({ "message": text })))
}

fn authorize(state: &MockState, auth: Option<TypedHeader<Authorization<Bearer>>>) -> Result<(), Reply> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match auth {
        None => Err(message(StatusCode::UNAUTHORIZED, "No token provided")),
        Some(TypedHeader(auth)) if auth.token() == TOKEN => Ok(()),
        Some(_) => Err(message(StatusCode::FORBIDDEN, "Invalid token")),
    }
}

fn parse_fields(body: &Value) -> Result<Value, Reply> {
    let title = body["title"].as_str().unwrap_or_default();
    let author = body["author"].as_str().unwrap_or_default();
    if title.is_empty() || author.is_empty() {
        return Err(message(StatusCode::BAD_REQUEST, "Title and author are required"));
    }
    Ok(json!({
        "title": title,
        "author": author,
        "year": body["year"],
        "genre": body["genre"],
        "description": body["description"],
    }))
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return message(StatusCode::BAD_REQUEST, "Name is required");
    }

    let mut users = state.users.lock().unwrap();
    if users.iter().any(|(known, _)| known == &email) {
        return message(StatusCode::CONFLICT, "User already exists");
    }
    users.push((email, password));
    message(StatusCode::CREATED, "User registered successfully")
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let users = state.users.lock().unwrap();
    if users.iter().any(|(e, p)| e == email && p == password) {
        (StatusCode::OK, Json(json!({ "data": { "token": TOKEN } })))
    } else {
        message(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn list_books(
    State(state): State<Arc<MockState>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Reply, Reply> {
    authorize(&state, auth)?;
    let books = state.books.lock().unwrap().clone();
    Ok((StatusCode::OK, Json(json!({ "success": true, "data": books }))))
}

async fn get_book(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Reply, Reply> {
    authorize(&state, auth)?;
    let books = state.books.lock().unwrap();
    let book = books.iter()
        .find(|book| book["id"].to_string() == id)
        .ok_or_else(|| message(StatusCode::NOT_FOUND, "Book not found"))?;
    Ok((StatusCode::OK, Json(json!({ "data": book }))))
}

async fn create_book(
    State(state): State<Arc<MockState>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    authorize(&state, auth)?;
    let mut book = parse_fields(&body)?;
    book["id"] = json!(state.next_id.fetch_add(1, Ordering::SeqCst));
    state.books.lock().unwrap().push(book.clone());
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": book }))))
}

async fn update_book(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    authorize(&state, auth)?;
    let mut fields = parse_fields(&body)?;
    let mut books = state.books.lock().unwrap();
    let book = books.iter_mut()
        .find(|book| book["id"].to_string() == id)
        .ok_or_else(|| message(StatusCode::NOT_FOUND, "Book not found"))?;
    fields["id"] = book["id"].clone();
    *book = fields.clone();
    Ok((StatusCode::OK, Json(json!({ "data": fields }))))
}

async fn delete_book(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Reply, Reply> {
    authorize(&state, auth)?;
    let mut books = state.books.lock().unwrap();
    let before = books.len();
    books.retain(|book| book["id"].to_string() != id);
    if books.len() == before {
        return Err(message(StatusCode::NOT_FOUND, "Book not found"));
    }
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}

pub fn book(id: &str, title: &str, author: &str) -> Book {
    Book {
        id: BookId::from(id),
        title: title.to_string(),
        author: author.to_string(),
        year: None,
        genre: None,
        description: None,
    }
}

/// Scripted `BookApi` that answers list calls from a queue, each after its own delay.
///
/// Calls beyond the script answer immediately with the current `books`.
#[derive(Default)]
pub struct ScriptedApi {
    pub books: Mutex<Vec<Book>>,
    lists: Mutex<VecDeque<(Duration, Result<Vec<Book>, ApiError>)>>,
    delete_results: Mutex<VecDeque<Result<bool, ApiError>>>,
    pub list_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn with_books(books: Vec<Book>) -> Self {
        Self { books: Mutex::new(books), ..Default::default() }
    }

    pub fn script_list(&self, delay: Duration, result: Result<Vec<Book>, ApiError>) {
        self.lists.lock().unwrap().push_back((delay, result));
    }

    pub fn script_delete(&self, result: Result<bool, ApiError>) {
        self.delete_results.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl BookApi for ScriptedApi {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        if email == EMAIL && password == PASSWORD {
            Ok(TOKEN.to_string())
        } else {
            Err(ApiError::Auth("Invalid credentials".to_string()))
        }
    }

    async fn register(&self, _form: &SignupForm) -> Result<String, ApiError> {
        Ok("User registered successfully".to_string())
    }

    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.lists.lock().unwrap().pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(self.books.lock().unwrap().clone()),
        }
    }

    async fn get_book(&self, id: &BookId) -> Result<Book, ApiError> {
        self.books.lock().unwrap().iter()
            .find(|book| &book.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))
    }

    async fn create_book(&self, fields: &BookFields) -> Result<Book, ApiError> {
        let mut books = self.books.lock().unwrap();
        let book = Book {
            id: BookId::from(format!("new-{}", books.len() + 1)),
            title: fields.title.clone(),
            author: fields.author.clone(),
            year: fields.year,
            genre: fields.genre.clone(),
            description: fields.description.clone(),
        };
        books.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: &BookId, fields: &BookFields) -> Result<Book, ApiError> {
        let mut books = self.books.lock().unwrap();
        let book = books.iter_mut()
            .find(|book| &book.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))?;
        book.title = fields.title.clone();
        book.author = fields.author.clone();
        book.year = fields.year;
        Ok(book.clone())
    }

    async fn delete_book(&self, id: &BookId) -> Result<bool, ApiError> {
        if let Some(result) = self.delete_results.lock().unwrap().pop_front() {
            return result;
        }
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|book| &book.id != id);
        if books.len() == before {
            return Err(ApiError::NotFound(format!("book {}", id)));
        }
        Ok(true)
    }
}
