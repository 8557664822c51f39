use crate::path::MountTable;

/// Selects which `LockCache` implementation the `Dispatcher` uses.
///
/// `Disabled` is the default: LOCK always succeeds and write handlers never
/// consult the `If` header. `Enforced` turns on the full get-and-compare
/// lock cache for every write method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    #[default]
    Disabled,
    Enforced,
}

/// Server-wide configuration, built once at startup and shared read-only
/// across requests.
#[derive(Debug, Clone)]
pub struct WebdavConfig {
    mounts: MountTable,
    css: Vec<String>,
    javascript: Vec<String>,
    class_directory: String,
    div: Option<String>,
    lock_policy: LockPolicy,
}

impl Default for WebdavConfig {
    fn default() -> Self {
        WebdavConfig {
            mounts: MountTable::new(),
            css: Vec::new(),
            javascript: Vec::new(),
            class_directory: "directory".to_string(),
            div: None,
            lock_policy: LockPolicy::default(),
        }
    }
}

impl WebdavConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    pub fn mount(mut self, m: crate::path::Mountpoint) -> Self {
        self.mounts.add(m);
        self
    }

    pub fn css(mut self, url: impl Into<String>) -> Self {
        self.css.push(url.into());
        self
    }

    pub fn javascript(mut self, url: impl Into<String>) -> Self {
        self.javascript.push(url.into());
        self
    }

    pub fn class_directory(mut self, name: impl Into<String>) -> Self {
        self.class_directory = name.into();
        self
    }

    pub fn div(mut self, id: impl Into<String>) -> Self {
        self.div = Some(id.into());
        self
    }

    pub fn lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    pub fn css_links(&self) -> &[String] {
        &self.css
    }

    pub fn javascript_links(&self) -> &[String] {
        &self.javascript
    }

    pub fn class_directory_name(&self) -> &str {
        &self.class_directory
    }

    pub fn div_id(&self) -> Option<&str> {
        self.div.as_deref()
    }

    pub fn lock_policy_value(&self) -> LockPolicy {
        self.lock_policy
    }
}
