use std::io::ErrorKind;
use std::path::Path;

use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::path::{PathResolver, ResolvedPath};
use crate::request::{DavRequest, DavResponseSink};

/// DELETE: resolve, then remove the file or recursively remove the
/// directory tree. Unlike PROPFIND/MOVE/COPY this crate does not
/// special-case `Depth: 0` for DELETE.
pub fn handle(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let abs = match PathResolver::resolve(ctx.mount, ctx.rel_path)? {
        ResolvedPath::Existing(p) => p,
        ResolvedPath::Prospective(_) => unreachable!(),
    };

    if ctx.config.lock_policy_value() == crate::config::LockPolicy::Enforced {
        let key = ctx.lock_key(req.host());
        let submitted = req.header("If").map(extract_token).unwrap_or_default();
        let tokens: Vec<&str> = submitted.iter().map(String::as_str).collect();
        if ctx.lock_cache.check(&key, &tokens).is_err() {
            return Err(DavError::Locked);
        }
    }

    let meta = std::fs::metadata(&abs)?;
    if meta.is_dir() {
        delete_tree(&abs)?;
    } else {
        std::fs::remove_file(&abs).map_err(|_| DavError::Forbidden)?;
    }

    ctx.lock_cache.delete(&ctx.lock_key(req.host()));

    res.prepare_headers(StatusCode::OK);
    res.add_content_length(0);
    Ok(())
}

/// Try `rmdir` first; on `ENOTEMPTY`, delete every child (recursing into
/// subdirectories) and retry.
fn delete_tree(dir: &Path) -> DavResult<()> {
    match std::fs::remove_dir(dir) {
        Ok(()) => return Ok(()),
        Err(e) if is_not_empty(&e) => {}
        Err(_) => return Err(DavError::Forbidden),
    }

    for entry in std::fs::read_dir(dir).map_err(|_| DavError::Forbidden)? {
        let entry = entry.map_err(|_| DavError::Forbidden)?;
        let child = entry.path();
        let child_meta = entry.metadata().map_err(|_| DavError::Forbidden)?;
        if child_meta.is_dir() {
            delete_tree(&child)?;
        } else {
            std::fs::remove_file(&child).map_err(|_| DavError::Forbidden)?;
        }
    }

    std::fs::remove_dir(dir).map_err(|_| DavError::Forbidden)
}

fn is_not_empty(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::Other || e.raw_os_error() == Some(libc_enotempty())
}

#[cfg(unix)]
fn libc_enotempty() -> i32 {
    libc::ENOTEMPTY
}

#[cfg(not(unix))]
fn libc_enotempty() -> i32 {
    39
}

/// Pull bare tokens out of a (simplified) `If` header of the shape
/// `(<opaquelocktoken:TOKEN>)`.
fn extract_token(header: &str) -> Vec<String> {
    header
        .split(|c| c == '(' || c == ')' || c == '<' || c == '>')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeRequest, FakeResponse};

    fn ctx_for<'a>(
        table: &'a crate::path::MountTable,
        config: &'a crate::config::WebdavConfig,
        cache: &'a dyn crate::lockcache::LockCache,
        rel: &'a str,
    ) -> HandlerCtx<'a> {
        let (mount, rel) = table.lookup(rel).unwrap();
        HandlerCtx::new(mount, rel, config, cache)
    }

    #[test]
    fn delete_removes_file() {
        let table = crate::testutil::single_mount();
        let (mount, _) = table.lookup("/").unwrap();
        std::fs::write(mount.docroot().join("a.txt"), b"x").unwrap();
        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache, "/a.txt");
        let mut req = FakeRequest::new("DELETE", "/a.txt", "example.org", vec![]);
        let mut res = FakeResponse::default();
        handle(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(StatusCode::OK));
        assert!(!mount.docroot().join("a.txt").exists());
    }

    #[test]
    fn delete_removes_nested_directory() {
        let table = crate::testutil::single_mount();
        let (mount, _) = table.lookup("/").unwrap();
        std::fs::create_dir(mount.docroot().join("sub")).unwrap();
        std::fs::write(mount.docroot().join("sub/a.txt"), b"x").unwrap();
        std::fs::create_dir(mount.docroot().join("sub/nested")).unwrap();
        std::fs::write(mount.docroot().join("sub/nested/b.txt"), b"y").unwrap();
        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache, "/sub");
        let mut req = FakeRequest::new("DELETE", "/sub", "example.org", vec![]);
        let mut res = FakeResponse::default();
        handle(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(StatusCode::OK));
        assert!(!mount.docroot().join("sub").exists());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let table = crate::testutil::single_mount();
        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache, "/missing");
        let mut req = FakeRequest::new("DELETE", "/missing", "example.org", vec![]);
        let mut res = FakeResponse::default();
        let err = handle(&mut req, &mut res, &ctx).unwrap_err();
        assert_eq!(err.statuscode(), StatusCode::NOT_FOUND);
    }
}
