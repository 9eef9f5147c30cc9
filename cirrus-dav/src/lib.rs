// utils
pub mod error;
pub mod xml;

// webdav
pub mod decoder;
pub mod encoder;
pub mod types;

use error::ParsingError;
use quick_xml::reader::NsReader;

/// Parse a 207 multi-status body into its typed document.
pub async fn parse_multistatus(body: &[u8]) -> Result<types::Multistatus, ParsingError> {
    tracing::trace!(len = body.len(), "parsing multi-status body");
    let mut rdr = xml::Reader::new(NsReader::from_reader(body)).await?;
    rdr.find::<types::Multistatus>().await
}

/// Parse a LOCK success body (`prop/lockdiscovery/activelock`).
pub async fn parse_lock_response(body: &[u8]) -> Result<types::LockResponse, ParsingError> {
    tracing::trace!(len = body.len(), "parsing lock body");
    let mut rdr = xml::Reader::new(NsReader::from_reader(body)).await?;
    rdr.find::<types::LockResponse>().await
}
