//! Async client for the WebDAV-extended HTTP server embedded in router
//! cloud-disk firmware.
//!
//! The server speaks RFC 4918 WebDAV plus a family of vendor verbs (WOL,
//! GSL, RESCANSMBPC, GETROUTERINFO, ...) carrying flat key/value request
//! headers. One [`Client`] is configured once with protocol/host/port and
//! may issue any number of concurrent requests; callers that need ordering
//! await each call before issuing the next.

mod client;
mod config;
mod error;
mod header;
mod lock;
mod request;
mod response;
mod transport;
mod tree;

pub use client::Client;
pub use config::{BasicAuth, ClientConfig, Protocol};
pub use error::{Error, MalformedResponse};
pub use header::Headers;
pub use lock::{LockInfo, LockPhase};
pub use request::{
    ByteRange, DavMethod, LockParams, MediaListQuery, RequestSpec, RootCertParams,
    TwitterUploadParams, INFINITE_TIMEOUT,
};
pub use response::{Content, DavResponse};
pub use tree::{build_tree, Resource, TreeError};

pub use cirrus_dav as dav;
