pub mod cookies;
pub mod slug;

pub use cookies::*;
pub use slug::*;
