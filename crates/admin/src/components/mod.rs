//! Reusable view pieces for admin templates.
//!
//! - [`notice`] - Success banners, error banners and blocking alerts
//! - [`tabs`] - Tab strips on detail pages
//! - [`pager`] - Previous/next links for paged lists

pub mod notice;
pub mod pager;
pub mod tabs;

pub use notice::{Notice, NoticeKind, NoticeQuery, redirect_with};
pub use pager::Pager;
pub use tabs::{Tab, TabSet};
