use crate::models::book::Book;

/// Case-insensitive substring match on title or author, in collection order.
///
/// An empty query keeps every book.
pub fn filter_books(books: &[Book], query: &str) -> Vec<Book> {
    if query.is_empty() {
        return books.to_vec();
    }

    let query = query.to_lowercase();
    books.iter()
        .filter(|book| book.matches(&query))
        .cloned()
        .collect()
}
