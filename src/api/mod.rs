pub mod cache;
pub mod client;
pub mod feed;
pub mod model;

pub use cache::*;
pub use client::*;
pub use feed::*;
pub use model::*;
