//! GitHub REST client implementing the core host surface.

mod client;
mod error;

pub use client::GithubClient;
pub use error::{GithubHttpError, GithubHttpErrorKind};
