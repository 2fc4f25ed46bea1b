//! Breadcrumb navigation over lazily listed hierarchies.
//!
//! [`HierarchyBrowser`] holds the trail and the tip's listing and decides
//! which fetch results still apply. [`BrowserSession`] drives it against a
//! [`vaultview_provider::HierarchyProvider`] and publishes every change.

#![warn(missing_docs)]

pub mod path;
pub mod breadcrumb;
pub mod error;
pub mod browser;
pub mod session;

pub use breadcrumb::{BreadcrumbNode, Breadcrumbs};
pub use error::{BrowseError, Result};
pub use browser::{
    Applied, BrowseMode, BrowserConfig, BrowserView, FetchRequest, FetchTicket, HierarchyBrowser,
    Listing, LoadState,
};
pub use session::BrowserSession;
