//! Slot configuration

/// Default cap on chained redirects
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

/// Router slot configuration
#[derive(Debug, Clone)]
pub struct SlotConfig {
    /// Label used in logs (default: "slot")
    pub name: String,
    /// Redirects allowed inside one external navigation (default: 8)
    pub max_redirects: usize,
    /// Ask the scroll handler to scroll to top after a commit (default: true)
    pub scroll_on_commit: bool,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            name: "slot".to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            scroll_on_commit: true,
        }
    }
}

impl SlotConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn scroll_on_commit(mut self, enabled: bool) -> Self {
        self.scroll_on_commit = enabled;
        self
    }
}
