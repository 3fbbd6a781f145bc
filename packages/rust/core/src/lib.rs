//! Decision-record indexing for adr-tools.
//!
//! This crate turns the decision records found on a repository's base branch
//! and on labeled review-request branches into a single index document, and
//! publishes it through a [`RepositoryHost`](adrtools_forge::RepositoryHost)
//! when it changed (see [`rebuild::rebuild_index`]). It also scaffolds new
//! local records ([`scaffold::create_decision`]).

pub mod collector;
pub mod decision;
pub mod discovery;
pub mod index;
pub mod publisher;
pub mod rebuild;
pub mod scaffold;

#[cfg(test)]
mod testing;
