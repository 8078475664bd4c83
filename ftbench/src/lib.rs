// TODO make the index name and result window configurable once there is more than one scenario
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
// indexing the corpus out of bounds is a caller bug
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod command;
pub mod config;
pub mod corpus;
pub mod loader;
pub mod profile;
pub mod runner;
pub mod sampler;

pub use command::SearchCommand;
pub use corpus::Corpus;
pub use profile::{LoadProfile, Stage};
pub use sampler::{Query, QuerySampler};
