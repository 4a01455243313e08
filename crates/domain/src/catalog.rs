//! Catalog management: superuser-gated CRUD over books.

use std::sync::Arc;

use common::{BookId, Money};
use store::{Book, BookRepository, Store, StoreError, StoreTx};

use crate::error::{CatalogError, DomainError};
use crate::policy::{self, Actor};

/// Input for creating a book.
#[derive(Debug, Clone)]
pub struct BookDraft {
    pub name: String,
    pub author: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
}

/// Partial update for a book; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Validation("Book name must not be empty.".to_string()));
    }
    Ok(())
}

fn validate_price(price: Money) -> Result<(), CatalogError> {
    if price.is_negative() {
        return Err(CatalogError::Validation("Price must not be negative.".to_string()));
    }
    Ok(())
}

fn map_name_conflict(err: StoreError, name: &str) -> DomainError {
    match err {
        StoreError::Conflict(_) => CatalogError::DuplicateName {
            name: name.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

/// High-level API for catalog operations.
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    /// Creates a new catalog service over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists all books. Any authenticated user may browse the catalog.
    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self) -> Result<Vec<Book>, DomainError> {
        let mut tx = self.store.begin().await?;
        let books = tx.list_books().await?;
        Ok(books)
    }

    /// Returns one book by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, DomainError> {
        let mut tx = self.store.begin().await?;
        let book = tx
            .get_book(book_id)
            .await?
            .ok_or(CatalogError::NotFound { book_id })?;
        Ok(book)
    }

    /// Creates a book owned by the acting superuser.
    #[tracing::instrument(skip(self, actor, draft), fields(user_id = %actor.id))]
    pub async fn create_book(&self, actor: &Actor, draft: BookDraft) -> Result<Book, DomainError> {
        if !policy::can_mutate_catalog(actor) {
            return Err(CatalogError::PermissionDenied.into());
        }
        validate_name(&draft.name)?;
        validate_price(draft.price)?;

        let book = Book {
            id: BookId::new(),
            name: draft.name,
            author: draft.author,
            description: draft.description,
            price: draft.price,
            stock: draft.stock,
            owner: actor.id,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_book(&book)
            .await
            .map_err(|e| map_name_conflict(e, &book.name))?;
        tx.commit().await?;

        tracing::info!(book_id = %book.id, name = %book.name, "book created");
        Ok(book)
    }

    /// Applies a partial update to a book.
    #[tracing::instrument(skip(self, actor, patch), fields(user_id = %actor.id))]
    pub async fn update_book(
        &self,
        actor: &Actor,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<Book, DomainError> {
        if !policy::can_mutate_catalog(actor) {
            return Err(CatalogError::PermissionDenied.into());
        }

        let mut tx = self.store.begin().await?;
        let mut book = tx
            .get_book_for_update(book_id)
            .await?
            .ok_or(CatalogError::NotFound { book_id })?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            book.name = name;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(description) = patch.description {
            book.description = description;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            book.price = price;
        }
        if let Some(stock) = patch.stock {
            book.stock = stock;
        }

        tx.update_book(&book)
            .await
            .map_err(|e| map_name_conflict(e, &book.name))?;
        tx.commit().await?;

        Ok(book)
    }

    /// Deletes a book from the catalog.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn delete_book(&self, actor: &Actor, book_id: BookId) -> Result<(), DomainError> {
        if !policy::can_mutate_catalog(actor) {
            return Err(CatalogError::PermissionDenied.into());
        }

        let mut tx = self.store.begin().await?;
        if !tx.delete_book(book_id).await? {
            return Err(CatalogError::NotFound { book_id }.into());
        }
        tx.commit().await?;

        tracing::info!(book_id = %book_id, "book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;
    use store::MemoryStore;

    fn draft(name: &str) -> BookDraft {
        BookDraft {
            name: name.to_string(),
            author: "Author".to_string(),
            description: None,
            price: Money::from_cents(1500),
            stock: 3,
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn superuser_creates_and_owns_books() {
        let service = service();
        let admin = Actor::superuser(UserId::new());

        let book = service.create_book(&admin, draft("Dune")).await.unwrap();

        assert_eq!(book.owner, admin.id);
        assert_eq!(service.get_book(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn ordinary_user_cannot_mutate_the_catalog() {
        let service = service();
        let user = Actor::user(UserId::new());

        let err = service.create_book(&user, draft("Dune")).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::PermissionDenied)
        ));

        let err = service
            .delete_book(&user, BookId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let service = service();
        let admin = Actor::superuser(UserId::new());

        service.create_book(&admin, draft("Dune")).await.unwrap();
        let err = service
            .create_book(&admin, draft("Dune"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::DuplicateName { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let service = service();
        let admin = Actor::superuser(UserId::new());

        let err = service.create_book(&admin, draft("  ")).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::Validation(_))
        ));

        let mut bad_price = draft("Dune");
        bad_price.price = Money::from_cents(-1);
        let err = service.create_book(&admin, bad_price).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn patch_updates_only_given_fields() {
        let service = service();
        let admin = Actor::superuser(UserId::new());
        let book = service.create_book(&admin, draft("Dune")).await.unwrap();

        let updated = service
            .update_book(
                &admin,
                book.id,
                BookPatch {
                    price: Some(Money::from_cents(999)),
                    stock: Some(42),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Dune");
        assert_eq!(updated.price.cents(), 999);
        assert_eq!(updated.stock, 42);
    }

    #[tokio::test]
    async fn updating_a_missing_book_is_not_found() {
        let service = service();
        let admin = Actor::superuser(UserId::new());

        let err = service
            .update_book(&admin, BookId::new(), BookPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let service = service();
        let admin = Actor::superuser(UserId::new());

        service.create_book(&admin, draft("Emma")).await.unwrap();
        service.create_book(&admin, draft("Dune")).await.unwrap();

        let names: Vec<String> = service
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["Dune", "Emma"]);
    }
}
