pub mod client;
pub mod error;
pub mod fetcher;
pub mod retry;
pub mod store;

pub use client::{PageSpeedClient, ReportSource};
pub use error::FetchError;
pub use fetcher::{FetchOutcome, Fetcher};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use store::ReportStore;
