use std::sync::Arc;

use common::{BookId, Money, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Actor, CartService, Checkout};
use store::{Book, BookRepository, MemoryStore, Store, StoreTx};

async fn seed_books(store: &MemoryStore, count: usize) -> Vec<BookId> {
    let mut tx = store.begin().await.unwrap();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let book = Book {
            id: BookId::new(),
            name: format!("Book {i}"),
            author: "Bench".to_string(),
            description: None,
            price: Money::from_cents(1000),
            stock: u32::MAX,
            owner: UserId::new(),
        };
        ids.push(book.id);
        tx.insert_book(&book).await.unwrap();
    }
    tx.commit().await.unwrap();
    ids
}

fn bench_upsert_line_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let books = rt.block_on(seed_books(&store, 10));
    let service = CartService::new(Arc::new(store));
    let actor = Actor::user(UserId::new());

    rt.block_on(async {
        for &book in &books {
            service.upsert_line_item(&actor, book, 1).await.unwrap();
        }
    });

    c.bench_function("cart/upsert_line_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .upsert_line_item(&actor, books[0], 2)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_order_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let books = rt.block_on(seed_books(&store, 5));
    let shared: Arc<dyn Store> = Arc::new(store);
    let carts = CartService::new(shared.clone());
    let checkout = Checkout::new(shared);
    let actor = Actor::user(UserId::new());

    c.bench_function("checkout/order_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                for &book in &books {
                    carts.upsert_line_item(&actor, book, 1).await.unwrap();
                }
                checkout.order_cart(&actor).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_upsert_line_item, bench_order_cart);
criterion_main!(benches);
