//! Database entities.

pub mod cart;
pub mod cart_item;
pub mod discount;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod store;

// Re-export entities
pub use cart::{CartStatus, Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use discount::{DiscountKind, Entity as Discount, Model as DiscountModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use payment::{Entity as Payment, Model as PaymentModel, PaymentStatus};
pub use product::{Entity as Product, Model as ProductModel};
pub use store::{Entity as Store, Model as StoreModel};
