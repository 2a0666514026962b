//! Messages carried across a POST/redirect/GET.
//!
//! Handlers redirect with `?success=`, `?error=` or `?alert=` and the target
//! page turns those into [`Notice`]s. Errors render as a dismissible banner;
//! alerts (failed deletes and bulk actions) block the page until acknowledged.

use axum::response::Redirect;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Alert,
}

impl NoticeKind {
    /// Query parameter the notice travels in.
    #[must_use]
    pub const fn param(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Alert => "alert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Alert,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self.kind, NoticeKind::Alert)
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "bg-green-50 text-green-800 border-green-200",
            NoticeKind::Error => "bg-red-50 text-red-800 border-red-200",
            NoticeKind::Alert => "bg-white text-red-900 border-red-400",
        }
    }
}

/// Notice parameters accepted by every page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeQuery {
    pub success: Option<String>,
    pub error: Option<String>,
    pub alert: Option<String>,
}

impl NoticeQuery {
    /// Notices to render, blocking alerts first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Some(message) = non_empty(self.alert.as_deref()) {
            notices.push(Notice::alert(message));
        }
        if let Some(message) = non_empty(self.error.as_deref()) {
            notices.push(Notice::error(message));
        }
        if let Some(message) = non_empty(self.success.as_deref()) {
            notices.push(Notice::success(message));
        }
        notices
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Redirect to `path` carrying one notice. `path` may already have a query.
#[must_use]
pub fn redirect_with(path: &str, kind: NoticeKind, message: &str) -> Redirect {
    Redirect::to(&notice_url(path, kind, message))
}

fn notice_url(path: &str, kind: NoticeKind, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{path}{separator}{}={}",
        kind.param(),
        urlencoding::encode(message)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_url_encodes_message() {
        assert_eq!(
            notice_url("/shipping/zones", NoticeKind::Alert, "Cannot delete zone & co"),
            "/shipping/zones?alert=Cannot%20delete%20zone%20%26%20co"
        );
    }

    #[test]
    fn test_notice_url_appends_to_existing_query() {
        assert_eq!(
            notice_url("/shipping/methods/4?tab=zones", NoticeKind::Success, "Done"),
            "/shipping/methods/4?tab=zones&success=Done"
        );
    }

    #[test]
    fn test_alerts_sort_first_and_blanks_are_dropped() {
        let query = NoticeQuery {
            success: Some("Saved".to_string()),
            error: Some("  ".to_string()),
            alert: Some("Cannot delete".to_string()),
        };
        let notices = query.notices();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].is_blocking());
        assert_eq!(notices[1], Notice::success("Saved"));
    }
}
