use std::sync::Arc;

use async_trait::async_trait;
use headers::{Authorization, HeaderMap, HeaderMapExt};
use log::{info, warn};
use reqwest::{IntoUrl, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::models::auth::{LoginRequest, SignupForm, TokenData};
use crate::models::book::{Book, BookFields, BookId, DataEnvelope, MessageEnvelope, SuccessEnvelope};
use crate::models::errors::ApiError;
use crate::session::SessionStore;

/// Operations of the library REST API.
///
/// Implementations never touch client-side state: they only report outcomes.
#[async_trait]
pub trait BookApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;

    async fn register(&self, form: &SignupForm) -> Result<String, ApiError>;

    async fn list_books(&self) -> Result<Vec<Book>, ApiError>;

    async fn get_book(&self, id: &BookId) -> Result<Book, ApiError>;

    async fn create_book(&self, fields: &BookFields) -> Result<Book, ApiError>;

    async fn update_book(&self, id: &BookId, fields: &BookFields) -> Result<Book, ApiError>;

    async fn delete_book(&self, id: &BookId) -> Result<bool, ApiError>;
}

pub struct LibraryClient {
    client: reqwest::Client,
    base_uri: String,
    session: Arc<dyn SessionStore>,
}

impl LibraryClient {
    pub fn new(client: reqwest::Client, base_uri: String, session: Arc<dyn SessionStore>) -> Self {
        let base_uri = base_uri.trim_end_matches('/').to_string();
        Self { client, base_uri, session }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    /// `{base}/books/{id}` with the id pushed as a single, percent-encoded segment.
    fn book_url(&self, id: &BookId) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url("/books"))
            .map_err(|err| ApiError::Network(format!("invalid api url {}: {}", self.base_uri, err)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("api url {} can't take a path", self.base_uri)))?
            .push(id.as_str());
        Ok(url)
    }

    fn authorized<U: IntoUrl>(&self, method: Method, url: U) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.request(method, url).headers(self.auth_header()?))
    }

    fn auth_header(&self) -> Result<HeaderMap, ApiError> {
        let token = self.session.token().ok_or_else(ApiError::missing_token)?;
        let auth = Authorization::bearer(&token)
            .map_err(|_| ApiError::Auth("stored token is not a valid bearer token".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.typed_insert(auth);
        Ok(headers)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.client.execute(request).await
            .map_err(|err| {
                warn!("{} {} failed: {}", method, url, err);
                ApiError::Network(err.to_string())
            })?;

        let status = response.status();
        info!("{} {} {}", method, url, status);
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<MessageEnvelope>(&body)
                .map(|envelope| envelope.message)
                .unwrap_or_else(|_| format!("{}, {}", status, url));
            return Err(ApiError::from_status(status, message));
        }

        response.json::<T>().await
            .map_err(|err| ApiError::Network(format!("unexpected response from {}: {}", url, err)))
    }
}

fn checked(book: Book) -> Result<Book, ApiError> {
    book.check_schema().map_err(ApiError::Network)?;
    Ok(book)
}

fn ensure_success(success: Option<bool>, what: &str) -> Result<(), ApiError> {
    match success {
        Some(false) => Err(ApiError::Network(format!("server reported failure for {}", what))),
        _ => Ok(()),
    }
}

#[async_trait]
impl BookApi for LibraryClient {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let request = self.client.post(self.url("/auth/login"))
            .json(&LoginRequest { email, password });

        let envelope: DataEnvelope<TokenData> = self.send(request).await
            .map_err(ApiError::into_login_failure)?;

        Ok(envelope.data.token)
    }

    async fn register(&self, form: &SignupForm) -> Result<String, ApiError> {
        let request = self.client.post(self.url("/auth/register")).json(form);

        let envelope: MessageEnvelope = self.send(request).await
            .map_err(ApiError::into_registration_failure)?;

        Ok(envelope.message)
    }

    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        let request = self.authorized(Method::GET, self.url("/books"))?;
        let envelope: DataEnvelope<Vec<Book>> = self.send(request).await?;
        ensure_success(envelope.success, "book list")?;

        envelope.data.into_iter().map(checked).collect()
    }

    async fn get_book(&self, id: &BookId) -> Result<Book, ApiError> {
        let request = self.authorized(Method::GET, self.book_url(id)?)?;
        let envelope: DataEnvelope<Book> = self.send(request).await?;

        checked(envelope.data)
    }

    async fn create_book(&self, fields: &BookFields) -> Result<Book, ApiError> {
        let request = self.authorized(Method::POST, self.url("/books"))?.json(fields);
        let envelope: DataEnvelope<Book> = self.send(request).await?;
        ensure_success(envelope.success, "new book")?;

        checked(envelope.data)
    }

    async fn update_book(&self, id: &BookId, fields: &BookFields) -> Result<Book, ApiError> {
        let request = self.authorized(Method::PUT, self.book_url(id)?)?.json(fields);
        let envelope: DataEnvelope<Book> = self.send(request).await?;

        checked(envelope.data)
    }

    async fn delete_book(&self, id: &BookId) -> Result<bool, ApiError> {
        let request = self.authorized(Method::DELETE, self.book_url(id)?)?;
        let envelope: SuccessEnvelope = self.send(request).await?;

        Ok(envelope.success)
    }
}
