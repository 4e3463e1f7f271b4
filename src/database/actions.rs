mod cart;
mod favorites;
mod ingredients;
mod listing;
mod recipes;
mod shopping_list;
mod validation;
mod views;

pub use cart::*;
pub use favorites::*;
pub use ingredients::*;
pub use listing::*;
pub use recipes::*;
pub use shopping_list::*;
pub use validation::*;
pub use views::*;
