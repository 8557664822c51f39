//! Core of a WebDAV (RFC 4918 class 1+2) server: maps host filesystem
//! directories to WebDAV collections over an abstract, synchronous
//! request/response boundary the embedding host implements.

mod config;
mod dispatcher;
mod errors;
mod fsmeta;
mod handle_copymove;
mod handle_delete;
mod handle_gethead;
mod handle_lock;
mod handle_mkcol;
mod handle_options;
mod handle_propfind;
mod handle_proppatch;
mod handle_put;
mod listing;
mod lockcache;
mod path;
mod propstore;
mod request;
#[cfg(test)]
mod testutil;
mod xml;

pub use config::{LockPolicy, WebdavConfig};
pub use dispatcher::{Dispatcher, HandlerCtx};
pub use errors::{DavError, DavResult};
pub use lockcache::{LockCache, MapLockCache, NoOpLockCache};
pub use path::{Mountpoint, MountTable, PathResolver, ResolvedPath};
pub use request::{overwrite_allowed, strip_destination_prefix, DavRequest, DavResponseSink, Depth};
