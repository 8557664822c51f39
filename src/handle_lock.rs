use http::StatusCode;

use crate::config::LockPolicy;
use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::request::{DavRequest, DavResponseSink};

/// LOCK: under the default `LockPolicy::Disabled`, drains and ignores the
/// body and answers 201 with no token (a degenerate lock that is never
/// actually enforced). Under `LockPolicy::Enforced`, inserts a fresh token
/// into the `LockCache` and returns it via `Lock-Token`.
pub fn handle_lock(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let _body = req.read_body(1 << 20).map_err(DavError::from)?;

    if ctx.config.lock_policy_value() != LockPolicy::Enforced {
        res.prepare_headers(StatusCode::CREATED);
        res.add_content_length(0);
        return Ok(());
    }

    let key = ctx.lock_key(req.host());
    let token = ctx.lock_cache.lock(&key);
    res.prepare_headers(StatusCode::CREATED);
    res.add_header("Lock-Token", &format!("<{}>", token));
    res.add_content_length(0);
    Ok(())
}

/// UNLOCK: only meaningful under `LockPolicy::Enforced`; otherwise 405,
/// since there is no lock to release.
pub fn handle_unlock(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    if ctx.config.lock_policy_value() != LockPolicy::Enforced {
        return Err(DavError::MethodNotAllowed);
    }

    let token = req
        .header("Lock-Token")
        .map(|t| t.trim_matches(|c| c == '<' || c == '>').to_string())
        .ok_or(DavError::Forbidden)?;

    let key = ctx.lock_key(req.host());
    if ctx.lock_cache.unlock(&key, &token) {
        res.prepare_headers(StatusCode::NO_CONTENT);
        res.add_content_length(0);
        Ok(())
    } else {
        Err(DavError::Conflict)
    }
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
    fn disabled_lock_returns_created_without_token() {
        let table = crate::testutil::single_mount();
        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache, "/a.txt");
        let mut req = FakeRequest::new("LOCK", "/a.txt", "example.org", vec![]);
        let mut res = FakeResponse::default();
        handle_lock(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(StatusCode::CREATED));
        assert!(!res.headers.contains_key("Lock-Token"));
    }

    #[test]
    fn enforced_lock_then_unlock_round_trips() {
        let table = crate::testutil::single_mount();
        let config = crate::config::WebdavConfig::new().lock_policy(LockPolicy::Enforced);
        let cache = crate::lockcache::MapLockCache::new();
        let ctx = ctx_for(&table, &config, &cache, "/a.txt");

        let mut req = FakeRequest::new("LOCK", "/a.txt", "example.org", vec![]);
        let mut res = FakeResponse::default();
        handle_lock(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(StatusCode::CREATED));
        let token = res.headers.get("Lock-Token").unwrap().trim_matches(|c| c == '<' || c == '>').to_string();

        let mut req = FakeRequest::new("UNLOCK", "/a.txt", "example.org", vec![("Lock-Token", &format!("<{}>", token))]);
        let mut res = FakeResponse::default();
        handle_unlock(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(StatusCode::NO_CONTENT));
    }

    #[test]
    fn disabled_unlock_is_method_not_allowed() {
        let table = crate::testutil::single_mount();
        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache, "/a.txt");
        let mut req = FakeRequest::new("UNLOCK", "/a.txt", "example.org", vec![]);
        let mut res = FakeResponse::default();
        let err = handle_unlock(&mut req, &mut res, &ctx).unwrap_err();
        assert_eq!(err.statuscode(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
