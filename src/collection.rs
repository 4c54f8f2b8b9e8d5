mod filter;
mod manager;
mod status;

pub use filter::filter_books;
pub use manager::{BookCollection, RefreshOutcome};
pub use status::{CollectionSnapshot, Operation, OperationStatus, OperationStatuses};
