use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::clients::library_client::BookApi;
use crate::collection::filter::filter_books;
use crate::collection::status::{CollectionSnapshot, Operation, OperationStatus};
use crate::drafts::Draft;
use crate::models::book::{Book, BookFields, BookId};
use crate::models::errors::ApiError;

const ADDED: &str = "Book added successfully!";
const UPDATED: &str = "Book updated successfully!";
const DELETED: &str = "Book deleted successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The server's list replaced the collection.
    Applied,
    /// A newer refresh was started, or the manager was closed, before this one completed.
    Discarded,
}

/// Owns the cached book list and keeps it in step with the library API.
///
/// Only the most recently started refresh may replace the collection. Create
/// and update re-fetch the whole list once the server accepted the change;
/// remove drops the book locally without a round trip.
pub struct BookCollection {
    api: Arc<dyn BookApi>,
    state: watch::Sender<CollectionSnapshot>,
    refresh_generation: AtomicU64,
    closed: AtomicBool,
}

impl BookCollection {
    pub fn new(api: Arc<dyn BookApi>) -> Self {
        let (state, _) = watch::channel(CollectionSnapshot::default());
        Self {
            api,
            state,
            refresh_generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        self.state.borrow().clone()
    }

    pub fn books(&self) -> Vec<Book> {
        self.state.borrow().books.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self, operation: Operation) -> OperationStatus {
        self.state.borrow().status.get(operation).clone()
    }

    /// Derived view over the current collection; the collection itself is untouched.
    pub fn filter(&self, query: &str) -> Vec<Book> {
        filter_books(&self.state.borrow().books, query)
    }

    /// Stops applying results. Requests still in flight complete but are ignored.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Forgets every cached book and makes in-flight refreshes stale.
    pub fn reset(&self) {
        self.refresh_generation.fetch_add(1, Ordering::SeqCst);
        self.mutate(|state| *state = CollectionSnapshot::default());
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, ApiError> {
        let generation = self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.mutate(|state| {
            state.begin(Operation::Refresh);
            state.success_message = None;
        });

        let result = self.api.list_books().await;
        if !self.is_current(generation) {
            debug!("discarding result of refresh #{}", generation);
            return Ok(RefreshOutcome::Discarded);
        }

        match result {
            Ok(books) => {
                debug!("refresh #{} loaded {} books", generation, books.len());
                let books = collapse_duplicates(books);
                self.mutate(|state| {
                    state.books = books;
                    state.error = None;
                    state.succeed(Operation::Refresh, None);
                });
                Ok(RefreshOutcome::Applied)
            }
            Err(err) => {
                warn!("refresh #{} failed: {}", generation, err);
                self.mutate(|state| state.fail(Operation::Refresh, &err));
                Err(err)
            }
        }
    }

    pub async fn create(&self, fields: BookFields) -> Result<Book, ApiError> {
        self.mutate(|state| state.begin(Operation::Create));
        let created = match fields.missing_required() {
            Some(message) => Err(ApiError::Validation(message.to_string())),
            None => self.api.create_book(&fields).await,
        };
        let book = self.settle(Operation::Create, created)?;
        info!("created book {}", book.id);

        let refreshed = self.refresh_after_change().await;
        self.mutate(|state| state.succeed(Operation::Create, refreshed.then_some(ADDED)));
        Ok(book)
    }

    pub async fn update(&self, id: &BookId, fields: BookFields) -> Result<Book, ApiError> {
        self.mutate(|state| state.begin(Operation::Update));
        let updated = match fields.missing_required() {
            Some(message) => Err(ApiError::Validation(message.to_string())),
            None => self.api.update_book(id, &fields).await,
        };
        let book = self.settle(Operation::Update, updated)?;
        info!("updated book {}", book.id);

        let refreshed = self.refresh_after_change().await;
        self.mutate(|state| state.succeed(Operation::Update, refreshed.then_some(UPDATED)));
        Ok(book)
    }

    /// Deletes on the server, then drops the book from the local list.
    ///
    /// Returns whether a local entry was removed; an id that is not cached is
    /// a no-op locally even when the server accepted the delete.
    pub async fn remove(&self, id: &BookId) -> Result<bool, ApiError> {
        self.mutate(|state| state.begin(Operation::Remove));
        let deleted = match self.api.delete_book(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ApiError::Network("Failed to delete book. Response format incorrect.".to_string())),
            Err(err) => Err(err),
        };
        self.settle(Operation::Remove, deleted)?;

        let mut removed = false;
        self.mutate(|state| {
            let before = state.books.len();
            state.books.retain(|book| &book.id != id);
            removed = state.books.len() != before;
            state.succeed(Operation::Remove, Some(DELETED));
        });
        info!("deleted book {} (cached: {})", id, removed);
        Ok(removed)
    }

    /// Fetches a book into a read-only draft for the details view.
    pub async fn load_details(&self, id: &BookId) -> Result<Draft, ApiError> {
        let book = self.load(id).await?;
        Ok(Draft::view(&book))
    }

    /// Fetches a book into an editable draft.
    pub async fn load_for_edit(&self, id: &BookId) -> Result<Draft, ApiError> {
        let book = self.load(id).await?;
        Ok(Draft::edit(&book))
    }

    async fn load(&self, id: &BookId) -> Result<Book, ApiError> {
        self.mutate(|state| state.begin(Operation::Load));
        let book = self.settle(Operation::Load, self.api.get_book(id).await)?;
        self.mutate(|state| state.succeed(Operation::Load, None));
        Ok(book)
    }

    /// False when the re-fetch failed; its error is already recorded under `Operation::Refresh`.
    async fn refresh_after_change(&self) -> bool {
        self.refresh().await.is_ok()
    }

    fn settle<T>(&self, operation: Operation, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(err) = &result {
            warn!("{:?} failed: {}", operation, err);
            self.mutate(|state| state.fail(operation, err));
        }
        result
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_closed() && self.refresh_generation.load(Ordering::SeqCst) == generation
    }

    fn mutate<F: FnOnce(&mut CollectionSnapshot)>(&self, modify: F) {
        if self.is_closed() {
            return;
        }
        self.state.send_modify(modify);
    }
}

/// One entry per id. A later record replaces the earlier one at the earlier position.
fn collapse_duplicates(books: Vec<Book>) -> Vec<Book> {
    let mut positions: HashMap<BookId, usize> = HashMap::with_capacity(books.len());
    let mut unique: Vec<Book> = Vec::with_capacity(books.len());

    for book in books {
        match positions.get(&book.id) {
            Some(&at) => {
                warn!("server listed book {} more than once", book.id);
                unique[at] = book;
            }
            None => {
                positions.insert(book.id.clone(), unique.len());
                unique.push(book);
            }
        }
    }
    unique
}
