use crate::dispatcher::HandlerCtx;
use crate::errors::DavResult;
use crate::request::{DavRequest, DavResponseSink};

/// OPTIONS always answers 200 with `Dav: 1, 2` and an empty body.
pub fn handle(_req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, _ctx: &HandlerCtx) -> DavResult<()> {
    res.prepare_headers(http::StatusCode::OK);
    res.add_header("Dav", "1, 2");
    res.add_content_length(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeRequest, FakeResponse};

    #[test]
    fn options_reports_dav_1_2() {
        let mut req = FakeRequest::new("OPTIONS", "/", "example.org", vec![]);
        let mut res = FakeResponse::default();
        let table = crate::testutil::single_mount();
        let config = crate::config::WebdavConfig::new();
        let (mount, rel) = table.lookup("/").unwrap();
        let cache = crate::lockcache::NoOpLockCache;
        let ctx = HandlerCtx::new(mount, rel, &config, &cache);
        handle(&mut req, &mut res, &ctx).unwrap();
        assert_eq!(res.status, Some(http::StatusCode::OK));
        assert_eq!(res.headers.get("Dav").map(String::as_str), Some("1, 2"));
    }
}
