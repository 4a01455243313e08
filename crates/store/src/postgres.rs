use async_trait::async_trait;
use common::{BookId, CartId, CartItemId, Money, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::records::{Book, Cart, CartItem};
use crate::repository::{BookRepository, CartRepository, Store, StoreTx};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} out of range: {value}")))
}

fn row_to_book(row: &PgRow) -> Result<Book> {
    Ok(Book {
        id: BookId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        author: row.try_get("author")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price")?),
        stock: to_u32(row.try_get("stock")?, "books.stock")?,
        owner: UserId::from_uuid(row.try_get::<Uuid, _>("owner_user_id")?),
    })
}

fn row_to_cart(row: &PgRow) -> Result<Cart> {
    Ok(Cart {
        id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        total_price: Money::from_cents(row.try_get("total_price")?),
        total_quantity: to_u32(row.try_get("total_quantity")?, "carts.total_quantity")?,
        is_ordered: row.try_get("is_ordered")?,
    })
}

fn row_to_item(row: &PgRow) -> Result<CartItem> {
    Ok(CartItem {
        id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
        book_id: BookId::from_uuid(row.try_get::<Uuid, _>("book_id")?),
        quantity: to_u32(row.try_get("quantity")?, "cart_items.quantity")?,
        price: Money::from_cents(row.try_get("price")?),
    })
}

/// Maps a unique-constraint violation onto [`StoreError::Conflict`],
/// carrying the constraint name.
fn map_constraint_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && let Some(constraint) = db_err.constraint()
    {
        tracing::debug!(constraint, "unique constraint violated");
        return StoreError::Conflict(constraint.to_string());
    }
    StoreError::Database(e)
}

const BOOK_COLUMNS: &str = "id, name, author, description, price, stock, owner_user_id";
const CART_COLUMNS: &str = "id, user_id, total_price, total_quantity, is_ordered";
const ITEM_COLUMNS: &str = "id, cart_id, book_id, quantity, price";

#[async_trait]
impl BookRepository for PgTx {
    async fn list_books(&mut self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY name ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_book).collect()
    }

    async fn get_book(&mut self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(row_to_book).transpose()
    }

    async fn get_book_for_update(&mut self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_book).transpose()
    }

    async fn insert_book(&mut self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, name, author, description, price, stock, owner_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price.cents())
        .bind(i64::from(book.stock))
        .bind(book.owner.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(map_constraint_err)?;

        Ok(())
    }

    async fn update_book(&mut self, book: &Book) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET name = $2, author = $3, description = $4, price = $5, stock = $6
            WHERE id = $1
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price.cents())
        .bind(i64::from(book.stock))
        .execute(&mut *self.tx)
        .await
        .map_err(map_constraint_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_book_stock(&mut self, id: BookId, stock: u32) -> Result<()> {
        sqlx::query("UPDATE books SET stock = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(i64::from(stock))
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn delete_book(&mut self, id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CartRepository for PgTx {
    async fn find_active_cart(&mut self, user_id: UserId) -> Result<Option<Cart>> {
        // Locked so that concurrent mutations of the same cart serialize on
        // this row for the duration of their transactions.
        let row = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND NOT is_ordered FOR UPDATE"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_cart).transpose()
    }

    async fn insert_cart(&mut self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_price, total_quantity, is_ordered)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.total_price.cents())
        .bind(i64::from(cart.total_quantity))
        .bind(cart.is_ordered)
        .execute(&mut *self.tx)
        .await
        .map_err(map_constraint_err)?;

        Ok(())
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE carts
            SET total_price = $2, total_quantity = $3, is_ordered = $4
            WHERE id = $1
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.total_price.cents())
        .bind(i64::from(cart.total_quantity))
        .bind(cart.is_ordered)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_cart(&mut self, id: CartId) -> Result<bool> {
        // cart_items references carts with ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn items_for_cart(&mut self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY id ASC"
        ))
        .bind(cart_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn get_item(&mut self, id: CartItemId) -> Result<Option<CartItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn upsert_item(&mut self, item: &CartItem) -> Result<CartItem> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cart_items (id, cart_id, book_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (cart_id, book_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, price = EXCLUDED.price
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.id.as_uuid())
        .bind(item.cart_id.as_uuid())
        .bind(item.book_id.as_uuid())
        .bind(i64::from(item.quantity))
        .bind(item.price.cents())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_item(&row)
    }

    async fn delete_item(&mut self, id: CartItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_items(&mut self, cart_id: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
