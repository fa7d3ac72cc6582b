//! Review request and response data shapes

mod lenient;
mod request;
mod types;

pub use request::ReviewRequest;
pub use types::{Article, Confidence, ErrorBody, ReviewResponse, Synthesis};
