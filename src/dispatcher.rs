use crate::config::{LockPolicy, WebdavConfig};
use crate::errors::{DavError, DavResult};
use crate::lockcache::{LockCache, MapLockCache, NoOpLockCache};
use crate::path::Mountpoint;
use crate::request::{DavRequest, DavResponseSink};

use crate::{
    handle_copymove, handle_delete, handle_gethead, handle_lock, handle_mkcol, handle_options,
    handle_propfind, handle_proppatch, handle_put,
};

/// Bundles the per-request context a handler needs: its mountpoint, the
/// path-info relative to that mountpoint, the shared configuration, and
/// the lock cache.
pub struct HandlerCtx<'a> {
    pub mount: &'a Mountpoint,
    pub rel_path: &'a str,
    pub config: &'a WebdavConfig,
    pub lock_cache: &'a dyn LockCache,
}

impl<'a> HandlerCtx<'a> {
    pub fn new(mount: &'a Mountpoint, rel_path: &'a str, config: &'a WebdavConfig, lock_cache: &'a dyn LockCache) -> Self {
        HandlerCtx { mount, rel_path, config, lock_cache }
    }

    /// The lock-cache key for this request: host + path-info, so virtual
    /// hosts partition the lock space.
    pub fn lock_key(&self, host: &str) -> String {
        format!("{}{}", host, self.rel_path)
    }
}

/// Maps HTTP method names to handlers and enforces request-level
/// preconditions.
pub struct Dispatcher {
    config: WebdavConfig,
    lock_cache: Box<dyn LockCache>,
}

impl Dispatcher {
    pub fn new(config: WebdavConfig) -> Self {
        let lock_cache: Box<dyn LockCache> = match config.lock_policy_value() {
            LockPolicy::Disabled => Box::new(NoOpLockCache),
            LockPolicy::Enforced => Box::new(MapLockCache::new()),
        };
        Dispatcher { config, lock_cache }
    }

    pub fn config(&self) -> &WebdavConfig {
        &self.config
    }

    /// Handle one request, writing status/headers/body to `res`. Errors are
    /// translated into a status-only response here; handlers never need to
    /// write an error response themselves.
    pub fn dispatch(&self, req: &mut dyn DavRequest, res: &mut dyn DavResponseSink) {
        if let Err(e) = self.try_dispatch(req, res) {
            res.prepare_headers(e.statuscode());
            if e.must_close() {
                res.add_header("Connection", "close");
            }
            res.add_content_length(0);
        }
    }

    fn try_dispatch(&self, req: &mut dyn DavRequest, res: &mut dyn DavResponseSink) -> DavResult<()> {
        if self.config.mounts().is_empty() {
            return Err(DavError::ConfigError);
        }
        let path_info = req.path_info().to_string();
        if path_info.is_empty() {
            return Err(DavError::Forbidden);
        }
        let (mount, rel_path) = self.config.mounts().lookup(&path_info).ok_or(DavError::Forbidden)?;
        let ctx = HandlerCtx::new(mount, rel_path, &self.config, self.lock_cache.as_ref());

        log::debug!("{} {}", req.method(), path_info);

        match req.method() {
            "OPTIONS" => handle_options::handle(req, res, &ctx),
            "GET" => handle_gethead::handle(req, res, &ctx, true),
            "HEAD" => handle_gethead::handle(req, res, &ctx, false),
            "PROPFIND" => handle_propfind::handle(req, res, &ctx),
            "PROPPATCH" => handle_proppatch::handle(req, res, &ctx),
            "PUT" => handle_put::handle(req, res, &ctx),
            "DELETE" => handle_delete::handle(req, res, &ctx),
            "MKCOL" => handle_mkcol::handle(req, res, &ctx),
            "MOVE" => handle_copymove::handle_move(req, res, &ctx),
            "COPY" => handle_copymove::handle_copy(req, res, &ctx),
            "LOCK" => handle_lock::handle_lock(req, res, &ctx),
            "UNLOCK" => handle_lock::handle_unlock(req, res, &ctx),
            // Unknown methods fall through with no response written.
            _ => Ok(()),
        }
    }
}
