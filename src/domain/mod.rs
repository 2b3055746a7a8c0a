pub mod channel;
pub mod insight;
pub mod pizza;
pub mod post;

pub use channel::normalize_handle;
pub use insight::{Impact, NewsInsight, Sentiment};
pub use pizza::{PizzaStats, MAX_PIZZA_LEVEL};
pub use post::{day_label, filter_by_source, Post};
