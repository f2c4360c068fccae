//! Domain types for McpSync
//!
//! - `server_record` - the canonical shape every source is mapped into
//! - `raw` - transient upstream shapes, alive only between fetch and transform

mod raw;
mod server_record;

pub use raw::{
    parse_timestamp, ChainBuildInfo, ChainDetails, ChainServer, ChainVersion, OfficialMeta,
    RawRemote, RawRepository, RawServerRecord, RegistryMeta, RegistryServer, OFFICIAL_META_KEY,
};
pub use server_record::{Remote, RemoteType, RepositoryRef, ServerRecord, ServerStatus};
