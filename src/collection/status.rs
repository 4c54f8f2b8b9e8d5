use crate::models::book::Book;
use crate::models::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Refresh,
    Create,
    Update,
    Remove,
    Load,
}

/// `Idle -> Loading -> {Success | Error}`; the next start goes back to `Loading`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl OperationStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, OperationStatus::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationStatuses {
    refresh: OperationStatus,
    create: OperationStatus,
    update: OperationStatus,
    remove: OperationStatus,
    load: OperationStatus,
}

impl OperationStatuses {
    pub fn get(&self, operation: Operation) -> &OperationStatus {
        match operation {
            Operation::Refresh => &self.refresh,
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Remove => &self.remove,
            Operation::Load => &self.load,
        }
    }

    fn get_mut(&mut self, operation: Operation) -> &mut OperationStatus {
        match operation {
            Operation::Refresh => &mut self.refresh,
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Remove => &mut self.remove,
            Operation::Load => &mut self.load,
        }
    }

    pub fn any_loading(&self) -> bool {
        [&self.refresh, &self.create, &self.update, &self.remove, &self.load]
            .iter()
            .any(|status| status.is_loading())
    }
}

/// Everything a renderer needs to draw the book list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionSnapshot {
    pub books: Vec<Book>,
    pub status: OperationStatuses,
    pub error: Option<String>,
    pub success_message: Option<String>,
}

impl CollectionSnapshot {
    /// Starting any operation clears the error left by an earlier one.
    pub(crate) fn begin(&mut self, operation: Operation) {
        *self.status.get_mut(operation) = OperationStatus::Loading;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, operation: Operation, message: Option<&str>) {
        *self.status.get_mut(operation) = OperationStatus::Success;
        if let Some(message) = message {
            self.success_message = Some(message.to_string());
        }
    }

    pub(crate) fn fail(&mut self, operation: Operation, err: &ApiError) {
        let message = err.user_message();
        *self.status.get_mut(operation) = OperationStatus::Error(message.clone());
        self.success_message = None;
        self.error = Some(message);
    }

    pub fn is_loading(&self) -> bool {
        self.status.any_loading()
    }
}
