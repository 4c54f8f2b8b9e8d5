use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::clients::library_client::{BookApi, LibraryClient};
use crate::collection::{BookCollection, RefreshOutcome};
use crate::config::app_config::AppConfig;
use crate::models::auth::SignupForm;
use crate::models::errors::ApiError;
use crate::session::{FileSession, SessionStore};

/// Wires the session, API client and collection manager together and owns the login flow.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<dyn SessionStore>,
    pub api: Arc<dyn BookApi>,
    pub books: Arc<BookCollection>,
}

impl AppState {
    /// Builds the reqwest-backed client with the token persisted on disk.
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let session: Arc<dyn SessionStore> = Arc::new(FileSession::open(config.session_path()?));

        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = LibraryClient::new(builder.build()?, config.api_url.clone(), session.clone());

        Ok(AppState::with_api(config, session, Arc::new(client)))
    }

    pub fn with_api(config: Arc<AppConfig>, session: Arc<dyn SessionStore>, api: Arc<dyn BookApi>) -> Self {
        let books = Arc::new(BookCollection::new(api.clone()));
        Self { config, session, api, books }
    }

    /// Stores the token and loads the collection right away.
    pub async fn login(&self, email: &str, password: &str) -> Result<RefreshOutcome, ApiError> {
        let token = self.api.login(email, password).await?;
        self.session.set_token(token)
            .map_err(|err| ApiError::Auth(format!("can't store session: {}", err)))?;
        info!("logged in as {}", email);

        self.books.refresh().await
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.clear()
            .map_err(|err| ApiError::Auth(format!("can't clear session: {}", err)))?;
        self.books.reset();
        info!("logged out");
        Ok(())
    }

    /// Validates the signup fields locally before asking the server to create the account.
    pub async fn register(&self, form: &SignupForm) -> Result<String, ApiError> {
        if let Err(errors) = form.validate() {
            let message = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join("; ");
            return Err(ApiError::Validation(message));
        }

        self.api.register(form).await
    }
}
