//! Read-only catalog lookups.

use crate::{
    case_insensitive_string_ext::CaseInsensitiveStrExt,
    error::BookstoreError,
    store::CatalogStore,
    types::{Book, Isbn, Reviews},
};

pub async fn by_isbn(catalog: &dyn CatalogStore, isbn: &Isbn) -> Result<Book, BookstoreError> {
    catalog.get_book(isbn).await?.ok_or(BookstoreError::NotFound)
}

pub async fn by_author(catalog: &dyn CatalogStore, query: &str) -> Result<Vec<Book>, BookstoreError> {
    matching(catalog, |book| book.author.contains_ignore_case(query)).await
}

pub async fn by_title(catalog: &dyn CatalogStore, query: &str) -> Result<Vec<Book>, BookstoreError> {
    matching(catalog, |book| book.title.contains_ignore_case(query)).await
}

pub async fn reviews_for(catalog: &dyn CatalogStore, isbn: &Isbn) -> Result<Reviews, BookstoreError> {
    Ok(by_isbn(catalog, isbn).await?.reviews)
}

async fn matching(
    catalog: &dyn CatalogStore,
    predicate: impl Fn(&Book) -> bool,
) -> Result<Vec<Book>, BookstoreError> {
    let books = catalog.list_books().await?;
    Ok(books.into_iter().filter(|b| predicate(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCatalog;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_json(
            r#"[
                {"isbn":"9780590353427","title":"Harry Potter and the Sorcerer's Stone","author":"J.K. Rowling"},
                {"isbn":"9780547928227","title":"The Hobbit","author":"J.R.R. Tolkien","reviews":{"bob":"fun"}}
            ]"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn author_search_is_case_insensitive() {
        let catalog = catalog();
        let found = by_author(&catalog, "rowling").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].author, "J.K. Rowling");
    }

    #[tokio::test]
    async fn no_match_is_empty_not_error() {
        let catalog = catalog();
        assert!(by_title(&catalog, "dune").await.unwrap().is_empty());
        assert_eq!(by_title(&catalog, "HOBBIT").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_isbn_is_not_found() {
        let catalog = catalog();
        assert!(matches!(
            by_isbn(&catalog, &Isbn("0000".into())).await,
            Err(BookstoreError::NotFound)
        ));
        assert!(matches!(
            reviews_for(&catalog, &Isbn("0000".into())).await,
            Err(BookstoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn reviews_default_to_empty() {
        let catalog = catalog();
        let reviews = reviews_for(&catalog, &Isbn("9780590353427".into()))
            .await
            .unwrap();
        assert!(reviews.is_empty());
        let reviews = reviews_for(&catalog, &Isbn("9780547928227".into()))
            .await
            .unwrap();
        assert_eq!(reviews.get("bob").map(String::as_str), Some("fun"));
    }
}
