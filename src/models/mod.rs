//! Data models and request/response bodies.

mod ingredient;
mod recipe;
mod tag;
mod user;

pub use ingredient::*;
pub use recipe::*;
pub use tag::*;
pub use user::*;
