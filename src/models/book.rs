use std::fmt;
use std::fmt::{Display, Formatter};

use serde::Deserializer;
use serde_derive::{Deserialize, Serialize};

/// Server-assigned book identifier.
///
/// The server is free to hand out numeric or string ids, both are kept as text.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        BookId(id.to_string())
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        BookId(id)
    }
}

impl From<u64> for BookId {
    fn from(id: u64) -> Self {
        BookId(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl<'de> serde::Deserialize<'de> for BookId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
    {
        let id = match <RawId as serde::Deserialize>::deserialize(deserializer)? {
            RawId::Number(id) => id.to_string(),
            RawId::Text(id) => id,
        };
        Ok(BookId(id))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Book {
    #[serde(alias = "_id")]
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Book {
    /// Rejects records that break the schema the rest of the client relies on.
    pub fn check_schema(&self) -> Result<(), String> {
        if self.id.as_str().is_empty() {
            return Err("book without identifier".to_string());
        }
        if self.title.trim().is_empty() {
            return Err(format!("book {} has an empty title", self.id));
        }
        if self.author.trim().is_empty() {
            return Err(format!("book {} has an empty author", self.id));
        }
        Ok(())
    }

    pub fn matches(&self, lowercase_query: &str) -> bool {
        self.title.to_lowercase().contains(lowercase_query)
            || self.author.to_lowercase().contains(lowercase_query)
    }
}

/// Body of create and update requests: a book without its identifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl BookFields {
    pub fn new<S: Into<String>>(title: S, author: S) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Names the first required field that is blank.
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("Title is required")
        } else if self.author.trim().is_empty() {
            Some("Author is required")
        } else {
            None
        }
    }
}

impl From<&Book> for BookFields {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year,
            genre: book.genre.clone(),
            description: book.description.clone(),
        }
    }
}

/// `{success?, data}` wrapper used by the book endpoints.
#[derive(Deserialize, Debug)]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: T,
}

#[derive(Deserialize, Debug)]
pub struct SuccessEnvelope {
    #[serde(default)]
    pub success: bool,
}

#[derive(Deserialize, Debug)]
pub struct MessageEnvelope {
    pub message: String,
}
