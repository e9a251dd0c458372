pub mod consumer;
pub mod decoder;
pub mod service;

pub use consumer::{MessageSource, ValkeyQueue, run_consumer};
pub use service::{FavoriteCategorySink, RecommendService, RecommendationSink};
