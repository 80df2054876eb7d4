//! GEIPAN CASE SCRAPER
//! Walks the public case search page by page, follows every case and
//! testimony link, and dumps batches of extracted records to numbered
//! JSON files.
// TODO:
//  -   Resume from a saved page index instead of always starting at 0.

mod error;
mod macros;
pub mod model;
mod parse;
pub mod process;
mod request;

pub use error::{Error, Result};

const BASE_URL: &str = "https://www.cnes-geipan.fr";
const PAGINATION_URL: &str = "https://www.cnes-geipan.fr/fr/recherche/cas/tab?";
/// Marker text the site renders on a listing page past the last result.
const EMPTY_MARKER: &str = "Aucun résultat";
/// Number of `.one_info-data` blocks a case sidebar is expected to render.
/// Sidebar fields are assigned by position, so a different count shifts them.
const SIDEBAR_BLOCKS: usize = 8;
/// Accumulated cases roll over to the next output file past this count.
const FLUSH_THRESHOLD: usize = 200;
const FILE_PREFIX: &str = "geipan";
/// Legacy mode: drop the accumulated batch on rollover instead of
/// flushing it to the outgoing file first.
const DISCARD_ON_ROLLOVER: bool = false;
