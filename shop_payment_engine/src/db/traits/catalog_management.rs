use crate::{
    db_types::{CartItem, NewProduct, Product},
    OrderFlowError,
};

/// Products and carts are managed elsewhere in the shop. The engine reads product prices and stock, and empties carts
/// once they have been turned into orders.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, OrderFlowError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError>;

    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderFlowError>;

    async fn add_to_cart(&self, user_id: &str, product_id: i64, quantity: i64) -> Result<CartItem, OrderFlowError>;

    /// Removes every item from the user's cart, returning the number of rows removed.
    async fn clear_cart(&self, user_id: &str) -> Result<u64, OrderFlowError>;
}
