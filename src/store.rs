use std::{collections::HashMap, error::Error};

use async_trait::async_trait;

use crate::types::{Book, HashedPassword, Isbn, User, Username};

pub type BoxError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Store the given user unless one with the same username already exists.
    /// Returns `true` if the user was created, `false` if the username was taken.
    async fn create_user_if_not_exists(&mut self, user: &User) -> Result<bool, BoxError>;

    /// Retrieve the hashed password of the user with the specified username, if any.
    async fn retrieve_user(&self, username: &Username) -> Result<Option<HashedPassword>, BoxError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Every book, in catalog order.
    async fn list_books(&self) -> Result<Vec<Book>, BoxError>;

    async fn get_book(&self, isbn: &Isbn) -> Result<Option<Book>, BoxError>;

    /// Insert the book, replacing any existing record with the same ISBN.
    async fn put_book(&mut self, book: Book) -> Result<(), BoxError>;
}

#[derive(Default)]
pub struct InMemoryCredentials {
    storage: HashMap<Username, HashedPassword>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentials {
    async fn create_user_if_not_exists(&mut self, user: &User) -> Result<bool, BoxError> {
        if self.storage.contains_key(&user.username) {
            return Ok(false);
        }

        self.storage
            .insert(user.username.clone(), user.hashed_password.clone());
        Ok(true)
    }

    async fn retrieve_user(&self, username: &Username) -> Result<Option<HashedPassword>, BoxError> {
        Ok(self.storage.get(username).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    books: Vec<Book>,
}

impl InMemoryCatalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// Parse a JSON array of books.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn list_books(&self) -> Result<Vec<Book>, BoxError> {
        Ok(self.books.clone())
    }

    async fn get_book(&self, isbn: &Isbn) -> Result<Option<Book>, BoxError> {
        Ok(self.books.iter().find(|b| b.isbn == *isbn).cloned())
    }

    async fn put_book(&mut self, book: Book) -> Result<(), BoxError> {
        match self.books.iter_mut().find(|b| b.isbn == book.isbn) {
            Some(existing) => *existing = book,
            None => self.books.push(book),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, hash: &str) -> User {
        User {
            username: Username(name.into()),
            hashed_password: HashedPassword(hash.into()),
        }
    }

    #[tokio::test]
    async fn usernames_are_immutable_once_created() {
        let mut store = InMemoryCredentials::new();

        assert!(store.create_user_if_not_exists(&user("alice", "h1")).await.unwrap());
        assert!(!store.create_user_if_not_exists(&user("alice", "h2")).await.unwrap());

        let stored = store
            .retrieve_user(&Username("alice".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.0, "h1");
        assert!(store
            .retrieve_user(&Username("bob".into()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn put_book_replaces_in_place() {
        let mut catalog = InMemoryCatalog::from_json(
            r#"[{"isbn":"1","title":"A","author":"X"},{"isbn":"2","title":"B","author":"Y"}]"#,
        )
        .unwrap();

        let mut first = catalog.get_book(&Isbn("1".into())).await.unwrap().unwrap();
        assert!(first.reviews.is_empty());
        first.title = "A, revised".into();
        catalog.put_book(first).await.unwrap();

        let titles: Vec<_> = catalog
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, ["A, revised", "B"]);
    }

    #[tokio::test]
    async fn bundled_catalog_parses() {
        let catalog = InMemoryCatalog::from_json(crate::SEED_CATALOG).unwrap();
        let book = catalog
            .get_book(&Isbn("9780590353427".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(book.author, "J.K. Rowling");
        assert!(catalog.list_books().await.unwrap().len() > 1);
    }
}
