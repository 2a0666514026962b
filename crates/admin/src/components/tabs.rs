//! Detail page tabs selected with `?tab=`.

/// One rendered tab link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub key: &'static str,
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// The tabs of one detail page and which one is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSet {
    pub tabs: Vec<Tab>,
    pub current: &'static str,
}

impl TabSet {
    /// Build the strip for `base`. Unknown or missing keys open the first tab.
    #[must_use]
    pub fn new(base: &str, tabs: &[(&'static str, &'static str)], requested: Option<&str>) -> Self {
        let current = tabs
            .iter()
            .map(|(key, _)| *key)
            .find(|key| Some(*key) == requested)
            .or_else(|| tabs.first().map(|(key, _)| *key))
            .unwrap_or_default();

        let tabs = tabs
            .iter()
            .map(|(key, label)| Tab {
                key,
                label,
                href: format!("{base}?tab={key}"),
                active: *key == current,
            })
            .collect();

        Self { tabs, current }
    }

    #[must_use]
    pub fn is(&self, key: &str) -> bool {
        self.current == key
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ZONE_TABS: [(&str, &str); 3] = [
        ("overview", "Overview"),
        ("regions", "Regions"),
        ("methods", "Methods"),
    ];

    #[test]
    fn test_requested_tab_is_active() {
        let set = TabSet::new("/shipping/zones/3", &ZONE_TABS, Some("regions"));
        assert!(set.is("regions"));
        assert_eq!(set.tabs[1].href, "/shipping/zones/3?tab=regions");
        assert!(set.tabs[1].active);
        assert!(!set.tabs[0].active);
    }

    #[test]
    fn test_unknown_tab_falls_back_to_first() {
        let set = TabSet::new("/shipping/zones/3", &ZONE_TABS, Some("billing"));
        assert!(set.is("overview"));
        let set = TabSet::new("/shipping/zones/3", &ZONE_TABS, None);
        assert!(set.is("overview"));
    }
}
