//! Mock collaborators for unit and integration tests.

mod mock_resolver;
mod mock_source;
mod mock_transcoder;

pub use mock_resolver::MockLocatorService;
pub use mock_source::MockCatalogSource;
pub use mock_transcoder::MockTranscoder;
