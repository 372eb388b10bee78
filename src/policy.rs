//! Review ownership: an authenticated user only ever writes or removes the
//! review slot keyed by their own username.
//!
//! Callers hold the catalog lock across a whole call, so each
//! read-modify-write of a book's reviews is atomic.

use crate::{
    error::BookstoreError,
    store::CatalogStore,
    types::{Isbn, Reviews, Username},
};

/// Create or overwrite `user`'s review of the book, returning the book's updated reviews.
pub async fn submit(
    catalog: &mut dyn CatalogStore,
    isbn: &Isbn,
    user: &Username,
    text: Option<&str>,
) -> Result<Reviews, BookstoreError> {
    let mut book = catalog.get_book(isbn).await?.ok_or(BookstoreError::NotFound)?;

    let text = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(BookstoreError::InvalidInput("review text required"))?;

    book.reviews.insert(user.0.clone(), text.to_owned());
    let reviews = book.reviews.clone();
    catalog.put_book(book).await?;

    Ok(reviews)
}

/// Delete `user`'s review of the book, returning the remaining reviews.
pub async fn remove(
    catalog: &mut dyn CatalogStore,
    isbn: &Isbn,
    user: &Username,
) -> Result<Reviews, BookstoreError> {
    let mut book = catalog.get_book(isbn).await?.ok_or(BookstoreError::NotFound)?;

    if book.reviews.remove(&user.0).is_none() {
        return Err(BookstoreError::NoSuchReview);
    }

    let reviews = book.reviews.clone();
    catalog.put_book(book).await?;

    Ok(reviews)
}
