use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::path::{PathResolver, ResolvedPath};
use crate::propstore::PropertyStore;
use crate::request::{DavRequest, DavResponseSink};
use crate::xml::{PropUpdateOp, XmlCodec};

/// PROPPATCH: resolve, parse the `propertyupdate` body, apply each
/// set/remove to the `PropertyStore`, and answer 207 Multi-Status with one
/// `propstat` per property.
pub fn handle(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let resolved = PathResolver::resolve(ctx.mount, ctx.rel_path)?;
    let abs = match resolved {
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

    let body = req.read_body(1 << 20).map_err(DavError::from)?;
    let ops = XmlCodec::parse_proppatch(&body)?;

    let mut results = Vec::with_capacity(ops.len());
    for op in ops {
        let status = match &op {
            PropUpdateOp::Set { local_name, namespace, value } => {
                match PropertyStore::set(&abs, local_name, namespace.as_deref(), value) {
                    Ok(()) => StatusCode::OK,
                    Err(_) => StatusCode::FORBIDDEN,
                }
            }
            PropUpdateOp::Remove { local_name, namespace } => {
                match PropertyStore::delete(&abs, local_name, namespace.as_deref()) {
                    Ok(()) => StatusCode::OK,
                    Err(_) => StatusCode::FORBIDDEN,
                }
            }
        };
        results.push((op, status));
    }

    let protocol = req.protocol().to_string();
    let body = XmlCodec::build_proppatch_response(&protocol, ctx.rel_path, &results)?;

    res.prepare_headers(StatusCode::MULTI_STATUS);
    res.add_content_type("application/xml; charset=\"utf-8\"");
    res.add_content_length(body.len() as u64);
    res.write_body(&body).map_err(DavError::from)?;
    Ok(())
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
        cache: &'a crate::lockcache::NoOpLockCache,
    ) -> HandlerCtx<'a> {
        let (mount, rel) = table.lookup("/a.txt").unwrap();
        HandlerCtx::new(mount, rel, config, cache)
    }

    #[test]
    fn set_then_propfind_round_trips_property() {
        let table = crate::testutil::single_mount();
        let (mount, _) = table.lookup("/").unwrap();
        std::fs::write(mount.docroot().join("a.txt"), b"x").unwrap();
        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache);

        let body = br#"<?xml version="1.0"?>
            <propertyupdate xmlns="DAV:" xmlns:x="http://example.org/">
              <set><prop><x:color>red</x:color></prop></set>
            </propertyupdate>"#;
        let mut req = FakeRequest::new("PROPPATCH", "/a.txt", "example.org", vec![]).with_body(body);
        let mut res = FakeResponse::default();
        handle(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(StatusCode::MULTI_STATUS));
        let text = String::from_utf8(res.body).unwrap();
        assert!(text.contains("200"));

        let (mount2, _) = table.lookup("/a.txt").unwrap();
        let abs = mount2.docroot().join("a.txt");
        let props = crate::propstore::PropertyStore::list(&abs, true).unwrap();
        assert!(props.iter().any(|(n, ns, v)| n == "color"
            && ns.as_deref() == Some("http://example.org/")
            && v.as_deref() == Some(&b"red"[..])));
    }

    #[test]
    fn remove_clears_property() {
        let table = crate::testutil::single_mount();
        let (mount, _) = table.lookup("/").unwrap();
        let abs = mount.docroot().join("a.txt");
        std::fs::write(&abs, b"x").unwrap();
        crate::propstore::PropertyStore::set(&abs, "color", Some("http://example.org/"), b"red").unwrap();

        let config = crate::config::WebdavConfig::new();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = ctx_for(&table, &config, &cache);

        let body = br#"<?xml version="1.0"?>
            <propertyupdate xmlns="DAV:" xmlns:x="http://example.org/">
              <remove><prop><x:color/></prop></remove>
            </propertyupdate>"#;
        let mut req = FakeRequest::new("PROPPATCH", "/a.txt", "example.org", vec![]).with_body(body);
        let mut res = FakeResponse::default();
        handle(&mut req, &mut res, &ctx).unwrap();

        let props = crate::propstore::PropertyStore::list(&abs, true).unwrap();
        assert!(!props.iter().any(|(n, _, _)| n == "color"));
    }
}
