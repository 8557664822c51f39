//! Fake `DavRequest`/`DavResponseSink` implementations used only by unit
//! tests in the handler modules.
#![cfg(test)]

use std::collections::HashMap;
use std::time::SystemTime;

use http::StatusCode;

use crate::path::{MountTable, Mountpoint};
use crate::request::{DavRequest, DavResponseSink};

pub struct FakeRequest {
    method: String,
    path_info: String,
    host: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl FakeRequest {
    pub fn new(method: &str, path_info: &str, host: &str, headers: Vec<(&str, &str)>) -> Self {
        FakeRequest {
            method: method.to_string(),
            path_info: path_info.to_string(),
            host: host.to_string(),
            headers: headers.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }
}

impl DavRequest for FakeRequest {
    fn method(&self) -> &str {
        &self.method
    }
    fn path_info(&self) -> &str {
        &self.path_info
    }
    fn protocol(&self) -> &str {
        "HTTP/1.1"
    }
    fn scheme(&self) -> &str {
        "http"
    }
    fn host(&self) -> &str {
        &self.host
    }
    fn app_id(&self) -> Option<&str> {
        None
    }
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
    fn content_length(&self) -> u64 {
        self.body.len() as u64
    }
    fn read_body(&mut self, max: usize) -> std::io::Result<Vec<u8>> {
        let take = max.min(self.body.len());
        Ok(self.body.drain(..take).collect())
    }
}

#[derive(Default)]
pub struct FakeResponse {
    pub status: Option<StatusCode>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl DavResponseSink for FakeResponse {
    fn prepare_headers(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }
    fn add_content_type(&mut self, value: &str) {
        self.add_header("Content-Type", value);
    }
    fn add_content_length(&mut self, n: u64) {
        self.add_header("Content-Length", &n.to_string());
    }
    fn add_last_modified(&mut self, t: SystemTime) {
        self.add_header("Last-Modified", &crate::xml::http_date(t));
    }
    fn write_body(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}

/// A single-mountpoint table rooted at a fresh temp directory, leaked for
/// the duration of the test process (tests are short-lived).
pub fn single_mount() -> MountTable {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.into_path();
    let mut table = MountTable::new();
    table.add(Mountpoint::new("/", &path).unwrap());
    table
}
