//! Catalogue fixtures shared by the integration and feature tests.
use crate::{
    db_types::{CustomerInfo, Money, NewProduct, Product},
    traits::CatalogManagement,
};

pub fn customer() -> CustomerInfo {
    CustomerInfo::new("Nguyen Van An", "an@example.com", "0901234567", "12 Le Loi, Quan 1, TP HCM")
}

/// Adds a product with the given whole-đồng price and stock level.
pub async fn add_product<B: CatalogManagement>(db: &B, name: &str, price_vnd: i64, stock: i64) -> Product {
    db.insert_product(NewProduct::new(name, Money::from_vnd(price_vnd), stock)).await.expect("Error adding product")
}

pub async fn stock_of<B: CatalogManagement>(db: &B, product_id: i64) -> i64 {
    db.fetch_product(product_id).await.expect("Error fetching product").expect("Product does not exist").stock
}
