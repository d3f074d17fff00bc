//! Business logic services used by the HTTP handlers.

pub mod carts;
pub mod checkout;
pub mod discounts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod stores;
