use cucumber::given;
use shop_payment_engine::{
    db_types::{Money, NewProduct},
    CatalogManagement,
};

use crate::cucumber::{shop_world::ShopSystem, ShopWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut ShopWorld) {
    let system = ShopSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the product {string} priced at {int} VND with {int} in stock")]
async fn add_product(world: &mut ShopWorld, name: String, price: i64, stock: i64) {
    let product = NewProduct::new(name.as_str(), Money::from_vnd(price), stock);
    let product = world.db().insert_product(product).await.expect("Error adding product");
    world.products.insert(name, product);
}

#[given(expr = "'{word}' has {int} of {string} in the cart")]
async fn add_to_cart(world: &mut ShopWorld, user_id: String, quantity: i64, name: String) {
    let product_id = world.product(&name).id;
    world.db().add_to_cart(&user_id, product_id, quantity).await.expect("Error adding to cart");
}
