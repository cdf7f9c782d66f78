mod setups;
mod steps;

pub use shop_world::ShopWorld;
