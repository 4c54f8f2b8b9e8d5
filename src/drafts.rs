use crate::collection::BookCollection;
use crate::models::book::{Book, BookFields, BookId};
use crate::models::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftIntent {
    Create,
    Edit(BookId),
    View(BookId),
}

/// Unsaved copy of a book's fields, kept as the text a form would hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    intent: DraftIntent,
    pub title: String,
    pub author: String,
    pub year: String,
    pub genre: String,
    pub description: String,
}

impl Draft {
    pub fn create() -> Self {
        Self {
            intent: DraftIntent::Create,
            title: String::new(),
            author: String::new(),
            year: String::new(),
            genre: String::new(),
            description: String::new(),
        }
    }

    pub fn edit(book: &Book) -> Self {
        Draft::from_book(book, DraftIntent::Edit(book.id.clone()))
    }

    pub fn view(book: &Book) -> Self {
        Draft::from_book(book, DraftIntent::View(book.id.clone()))
    }

    fn from_book(book: &Book, intent: DraftIntent) -> Self {
        Self {
            intent,
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.map(|year| year.to_string()).unwrap_or_default(),
            genre: book.genre.clone().unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
        }
    }

    pub fn intent(&self) -> &DraftIntent {
        &self.intent
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.intent, DraftIntent::View(_))
    }

    /// Converts the form text into a request body. Blank optional fields become `null`.
    pub fn to_fields(&self) -> Result<BookFields, ApiError> {
        let year = match self.year.trim() {
            "" => None,
            year => Some(year.parse::<i32>()
                .map_err(|_| ApiError::Validation("Year must be a number".to_string()))?),
        };

        Ok(BookFields {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            year,
            genre: non_blank(&self.genre),
            description: non_blank(&self.description),
        })
    }

    /// Sends the draft as a create or update, depending on its intent.
    pub async fn submit(&self, books: &BookCollection) -> Result<Book, ApiError> {
        match &self.intent {
            DraftIntent::Create => books.create(self.to_fields()?).await,
            DraftIntent::Edit(id) => books.update(id, self.to_fields()?).await,
            DraftIntent::View(id) => Err(ApiError::Validation(format!("book {} is opened read-only", id))),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() { None } else { Some(value.to_string()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    Add,
    Edit,
    Details,
}

/// Per-dialog drafts. A failed load keeps whatever draft the dialog already had.
#[derive(Debug, Default)]
pub struct BookDialogs {
    add: Option<Draft>,
    edit: Option<Draft>,
    details: Option<Draft>,
}

impl BookDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self, dialog: Dialog) -> Option<&Draft> {
        self.slot(dialog).as_ref()
    }

    pub fn draft_mut(&mut self, dialog: Dialog) -> Option<&mut Draft> {
        self.slot_mut(dialog).as_mut()
    }

    /// Opens the add form, keeping text typed before it was last closed without saving.
    pub fn open_add(&mut self) -> &mut Draft {
        self.add.get_or_insert_with(Draft::create)
    }

    pub async fn open_edit(&mut self, books: &BookCollection, id: &BookId) -> Result<&mut Draft, ApiError> {
        let draft = books.load_for_edit(id).await?;
        Ok(self.edit.insert(draft))
    }

    pub async fn open_details(&mut self, books: &BookCollection, id: &BookId) -> Result<&Draft, ApiError> {
        let draft = books.load_details(id).await?;
        Ok(self.details.insert(draft))
    }

    /// Cancel or close: the draft is discarded.
    pub fn close(&mut self, dialog: Dialog) {
        *self.slot_mut(dialog) = None;
    }

    /// Submits the dialog's draft and discards it once the server accepted it.
    pub async fn submit(&mut self, dialog: Dialog, books: &BookCollection) -> Result<Book, ApiError> {
        let draft = self.slot(dialog).clone()
            .ok_or_else(|| ApiError::Validation(format!("{:?} dialog is not open", dialog)))?;

        let book = draft.submit(books).await?;
        self.close(dialog);
        Ok(book)
    }

    fn slot(&self, dialog: Dialog) -> &Option<Draft> {
        match dialog {
            Dialog::Add => &self.add,
            Dialog::Edit => &self.edit,
            Dialog::Details => &self.details,
        }
    }

    fn slot_mut(&mut self, dialog: Dialog) -> &mut Option<Draft> {
        match dialog {
            Dialog::Add => &mut self.add,
            Dialog::Edit => &mut self.edit,
            Dialog::Details => &mut self.details,
        }
    }
}
