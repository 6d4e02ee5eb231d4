//! versewalk — a terminal front-end for the PoetryDB archive.
//!
//! Everything shown to the user comes straight from the remote HTTP API;
//! the crate adds no storage or indexing of its own beyond a bundled
//! author list used for instant author-mode search. The library half holds
//! the API client, the route model and the incremental-search state
//! machine; the CLI binary (and the `tui` feature) put terminal faces on
//! them.

pub mod api;
pub mod authors;
pub mod model;
pub mod routes;
pub mod search;
pub mod strip;
#[cfg(feature = "tui")]
pub mod tui;

pub use api::{ApiError, DEFAULT_BASE_URL, PoetryDb};
pub use authors::AuthorIndex;
pub use model::{Poem, SearchMode, SearchResult};
pub use routes::Route;
pub use search::{SearchJob, SearchSession};
