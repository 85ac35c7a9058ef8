pub mod envelope;
mod fetcher;

pub use fetcher::{FeedFetcher, FetchOutcome, FetchedResponse};
