pub mod chunk;
pub mod router;

pub use chunk::{extract_chunk, RawChunk};
pub use router::{route, Candidate, Route};
