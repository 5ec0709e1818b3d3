//! Observable in-memory cart.
//!
//! The cart is a plain ordered list of products: adding the same product twice
//! yields two entries. Every mutation publishes the full snapshot on a
//! `tokio::sync::watch` channel, so subscribers always see the latest state
//! and a late subscriber starts from the current one.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::info;

use tienda_core::{Product, ProductId};

/// Snapshot of the cart contents, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Sum of the prices of every entry. Computed on each call.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|p| p.price).sum()
    }

    /// Product id of every entry, repeated ids included.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|p| p.id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shared handle to the cart. Clones refer to the same cart.
#[derive(Debug, Clone)]
pub struct CartStore {
    tx: Arc<watch::Sender<Cart>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Cart::default());
        Self { tx: Arc::new(tx) }
    }

    /// Append a product.
    pub fn add(&self, product: Product) {
        info!(product_id = %product.id, name = %product.name, "Product added to cart");
        self.tx.send_modify(|cart| cart.items.push(product));
    }

    /// Remove every entry with the given product id.
    pub fn remove(&self, product_id: ProductId) {
        self.tx.send_modify(|cart| {
            let before = cart.items.len();
            cart.items.retain(|p| p.id != product_id);
            info!(
                product_id = %product_id,
                removed = before - cart.items.len(),
                "Product removed from cart"
            );
        });
    }

    /// Empty the cart.
    pub fn clear(&self) {
        info!("Cart cleared");
        self.tx.send_modify(|cart| cart.items.clear());
    }

    /// Subscribe to cart snapshots.
    ///
    /// The receiver is marked changed, so the first `changed().await` resolves
    /// immediately with the current contents.
    #[must_use]
    pub fn observe(&self) -> watch::Receiver<Cart> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        rx
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.tx.borrow().total()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            price: Decimal::new(cents, 2),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_add_keeps_duplicates_in_order() {
        let cart = CartStore::new();
        cart.add(product(1, 1000));
        cart.add(product(2, 550));
        cart.add(product(1, 1000));

        let snapshot = cart.snapshot();
        assert_eq!(
            snapshot.ids(),
            vec![ProductId::new(1), ProductId::new(2), ProductId::new(1)]
        );
        assert_eq!(snapshot.total(), Decimal::new(2550, 2));
    }

    #[test]
    fn test_remove_drops_every_entry_with_the_id() {
        let cart = CartStore::new();
        cart.add(product(7, 1999));
        cart.add(product(7, 1999));

        cart.remove(ProductId::new(7));

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let cart = CartStore::new();
        cart.add(product(1, 100));
        cart.remove(ProductId::new(2));
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_new_subscriber_sees_current_snapshot() {
        let cart = CartStore::new();
        cart.add(product(1, 100));

        let mut rx = cart.observe();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_latest_snapshot() {
        let cart = CartStore::new();
        let mut rx = cart.observe();
        let _ = rx.borrow_and_update();

        cart.add(product(1, 100));
        cart.add(product(2, 200));
        cart.clear();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());

        cart.add(product(3, 300));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().ids(), vec![ProductId::new(3)]);
    }

    #[test]
    fn test_clones_share_contents() {
        let cart = CartStore::new();
        let other = cart.clone();
        other.add(product(1, 100));
        assert_eq!(cart.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i32, i64),
        Remove(i32),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (1..6i32, 0..100_000i64).prop_map(|(id, cents)| Op::Add(id, cents)),
            2 => (1..6i32).prop_map(Op::Remove),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_remaining_prices(ops in prop::collection::vec(op(), 0..40)) {
            let cart = CartStore::new();
            let mut model: Vec<(i32, i64)> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(id, cents) => {
                        cart.add(product(id, cents));
                        model.push((id, cents));
                    }
                    Op::Remove(id) => {
                        cart.remove(ProductId::new(id));
                        model.retain(|(other, _)| *other != id);
                    }
                    Op::Clear => {
                        cart.clear();
                        model.clear();
                    }
                }
            }

            let expected: i64 = model.iter().map(|(_, cents)| cents).sum();
            prop_assert_eq!(cart.total(), Decimal::new(expected, 2));
            prop_assert_eq!(cart.len(), model.len());
        }
    }
}
