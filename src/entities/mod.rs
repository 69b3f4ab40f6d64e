pub mod cart_item;
pub mod chat_message;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;
pub mod wishlist_item;

pub use cart_item::Entity as CartItem;
pub use chat_message::Entity as ChatMessage;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use user::Entity as User;
pub use wishlist_item::Entity as WishlistItem;

pub type CartItemModel = cart_item::Model;
pub type ChatMessageModel = chat_message::Model;
pub type OrderModel = order::Model;
pub type OrderItemModel = order_item::Model;
pub type ProductModel = product::Model;
pub type UserModel = user::Model;
pub type WishlistItemModel = wishlist_item::Model;
