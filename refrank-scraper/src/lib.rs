pub mod client;
pub mod error;

pub use client::WikiClient;
pub use error::ScrapeError;
