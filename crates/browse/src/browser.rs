//! Breadcrumb-driven browsing of a remote hierarchy.
//!
//! [`HierarchyBrowser`] is a plain state object: navigation calls change the
//! trail and hand back a [`FetchTicket`] describing the provider call to make;
//! the caller runs it and feeds the outcome to [`HierarchyBrowser::apply`].
//!
//! Every ticket carries the browser's generation at issue time, and every
//! navigation bumps the generation. An outcome whose generation no longer
//! matches is stale and dropped without touching the state, so the listing
//! always belongs to the current tip regardless of the order in which
//! provider calls resolve.

use serde::Serialize;
use tracing::{debug, warn};
use vaultview_core::{BrowsePurpose, ChunkEntry, HierarchyEntry, ListOptions, TaskId};
use vaultview_provider::ProviderError;

use crate::breadcrumb::{BreadcrumbNode, Breadcrumbs};
use crate::error::{BrowseError, Result};
use crate::path;

/// Loading state of the tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadState {
    /// Nothing requested yet
    Idle,
    /// Waiting for the tip's listing
    Loading,
    /// Listing shown
    Loaded,
    /// Listing failed; retry offered
    Error,
}

/// Content shown for the tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum Listing {
    /// Directory content
    Entries(Vec<HierarchyEntry>),
    /// Chunks of a file
    Chunks(Vec<ChunkEntry>),
}

impl Default for Listing {
    fn default() -> Self {
        Listing::Entries(Vec::new())
    }
}

impl Listing {
    /// Number of items.
    pub fn len(&self) -> usize {
        match self {
            Listing::Entries(entries) => entries.len(),
            Listing::Chunks(chunks) => chunks.len(),
        }
    }

    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Directory entries; empty for chunk listings.
    pub fn entries(&self) -> &[HierarchyEntry] {
        match self {
            Listing::Entries(entries) => entries,
            Listing::Chunks(_) => &[],
        }
    }

    /// Chunks; empty for directory listings.
    pub fn chunks(&self) -> &[ChunkEntry] {
        match self {
            Listing::Entries(_) => &[],
            Listing::Chunks(chunks) => chunks,
        }
    }

    /// Find a directory entry by name.
    pub fn entry(&self, name: &str) -> Option<&HierarchyEntry> {
        self.entries().iter().find(|e| e.name == name)
    }
}

/// What is being browsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseMode {
    /// A backup or restore target picker
    Target(BrowsePurpose),
    /// The file tree of one task; files can be opened to list their chunks
    TaskContent(TaskId),
}

impl BrowseMode {
    /// Purpose passed to the provider.
    pub fn purpose(&self) -> BrowsePurpose {
        match self {
            BrowseMode::Target(purpose) => *purpose,
            BrowseMode::TaskContent(_) => BrowsePurpose::TaskContent,
        }
    }
}

/// Configuration for a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Label of the root node
    pub root_label: String,
    /// Ask the provider for directories only (target pickers)
    pub only_directories: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            root_label: "Root".to_string(),
            only_directories: false,
        }
    }
}

impl BrowserConfig {
    /// Set the root label.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    /// Set the directories-only flag.
    pub fn with_only_directories(mut self, only_directories: bool) -> Self {
        self.only_directories = only_directories;
        self
    }
}

/// Provider call to make for the tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// `HierarchyProvider::list`
    List {
        /// Request path (`None` = provider top level)
        path: Option<String>,
        /// Listing purpose
        purpose: BrowsePurpose,
        /// Listing options
        options: ListOptions,
    },
    /// `HierarchyProvider::list_chunks`
    Chunks {
        /// Task owning the file
        task_id: TaskId,
        /// File request path
        file_path: String,
    },
}

/// A provider call tagged with the generation it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Browser generation at issue time
    pub generation: u64,
    /// What to fetch
    pub request: FetchRequest,
}

/// Result of feeding a fetch outcome to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The outcome belonged to the current tip and was applied
    Current,
    /// Navigation moved on; the outcome was dropped
    Stale,
}

/// Everything the UI renders for a browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserView {
    /// Trail, root first
    pub breadcrumbs: Vec<BreadcrumbNode>,
    /// Display path of the tip
    pub display_path: String,
    /// Tip listing
    pub listing: Listing,
    /// Tip state
    pub state: LoadState,
    /// Failure message when `state` is `Error`
    pub error: Option<String>,
}

/// Breadcrumb stack plus the tip's listing state.
#[derive(Debug, Clone)]
pub struct HierarchyBrowser {
    mode: BrowseMode,
    config: BrowserConfig,
    trail: Breadcrumbs,
    generation: u64,
    state: LoadState,
    listing: Listing,
    error: Option<String>,
}

impl HierarchyBrowser {
    /// Create a browser positioned at the root, nothing requested yet.
    pub fn new(mode: BrowseMode, config: BrowserConfig) -> Self {
        let trail = Breadcrumbs::new(config.root_label.clone());
        Self {
            mode,
            config,
            trail,
            generation: 0,
            state: LoadState::Idle,
            listing: Listing::default(),
            error: None,
        }
    }

    /// Request the first listing of the root.
    pub fn open(&mut self) -> FetchTicket {
        self.issue(true)
    }

    /// Move into `entry` of the current listing.
    ///
    /// Returns `Ok(None)` when the entry resolves to the current tip (a
    /// repeated click), in which case nothing changes.
    pub fn descend(&mut self, entry: &HierarchyEntry) -> Result<Option<FetchTicket>> {
        let tip = self.trail.tip();
        if tip.is_leaf {
            return Err(BrowseError::BelowLeaf(tip.label.clone()));
        }

        let is_leaf = if entry.is_directory {
            false
        } else if matches!(self.mode, BrowseMode::TaskContent(_)) {
            true
        } else {
            return Err(BrowseError::NotADirectory(entry.name.clone()));
        };

        let request_path = path::join(tip.request_path.as_deref(), &entry.name);
        if tip.request_path.as_deref() == Some(request_path.as_str()) {
            debug!("Ignoring descend into current tip {}", request_path);
            return Ok(None);
        }

        self.trail.push(BreadcrumbNode {
            label: entry.name.clone(),
            request_path: Some(request_path),
            is_leaf,
        });
        Ok(Some(self.issue(true)))
    }

    /// Go back to trail position `index`, keeping nodes `0..=index`.
    pub fn jump_to(&mut self, index: usize) -> Result<FetchTicket> {
        self.trail.truncate_to(index)?;
        Ok(self.issue(true))
    }

    /// Go to the parent of the tip; `None` at the root.
    pub fn up(&mut self) -> Option<FetchTicket> {
        let parent = self.trail.len().checked_sub(2)?;
        self.jump_to(parent).ok()
    }

    /// Fetch the tip's listing again, keeping what is shown until it lands.
    pub fn reload(&mut self) -> FetchTicket {
        self.issue(false)
    }

    /// Feed the outcome of a ticket's provider call.
    pub fn apply(&mut self, generation: u64, outcome: std::result::Result<Listing, ProviderError>) -> Applied {
        if generation != self.generation {
            debug!(
                "Dropping stale listing (generation {}, current {})",
                generation, self.generation
            );
            return Applied::Stale;
        }

        match outcome {
            Ok(listing) => {
                self.listing = listing;
                self.state = LoadState::Loaded;
                self.error = None;
            }
            Err(err) => {
                warn!("Listing {} failed: {}", self.tip().display_path(), err);
                self.listing = Listing::default();
                self.state = LoadState::Error;
                self.error = Some(err.to_string());
            }
        }
        Applied::Current
    }

    fn issue(&mut self, tip_changed: bool) -> FetchTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.error = None;
        if tip_changed {
            self.listing = Listing::default();
        }

        FetchTicket {
            generation: self.generation,
            request: self.request_for_tip(),
        }
    }

    fn request_for_tip(&self) -> FetchRequest {
        let tip = self.trail.tip();
        match (&self.mode, tip.is_leaf) {
            (BrowseMode::TaskContent(task_id), true) => FetchRequest::Chunks {
                task_id: task_id.clone(),
                file_path: tip.request_path.clone().unwrap_or_default(),
            },
            (BrowseMode::TaskContent(task_id), false) => FetchRequest::List {
                path: tip.request_path.clone(),
                purpose: BrowsePurpose::TaskContent,
                options: ListOptions {
                    only_directories: self.config.only_directories,
                    task_id: Some(task_id.clone()),
                },
            },
            (BrowseMode::Target(purpose), _) => FetchRequest::List {
                path: tip.request_path.clone(),
                purpose: *purpose,
                options: ListOptions::targets(self.config.only_directories),
            },
        }
    }

    /// What is browsed.
    pub fn mode(&self) -> &BrowseMode {
        &self.mode
    }

    /// The trail.
    pub fn breadcrumbs(&self) -> &Breadcrumbs {
        &self.trail
    }

    /// Current position.
    pub fn tip(&self) -> &BreadcrumbNode {
        self.trail.tip()
    }

    /// Tip state.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Tip listing.
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Failure message of the tip.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request path a target picker would hand back; `None` at the root.
    pub fn selected_target(&self) -> Option<&str> {
        self.trail.tip().request_path.as_deref()
    }

    /// Snapshot for the UI.
    pub fn view(&self) -> BrowserView {
        BrowserView {
            breadcrumbs: self.trail.nodes().to_vec(),
            display_path: self.trail.tip().display_path(),
            listing: self.listing.clone(),
            state: self.state,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultview_core::ChunkStatus;

    fn target_browser() -> HierarchyBrowser {
        HierarchyBrowser::new(BrowseMode::Target(BrowsePurpose::BackupTarget), BrowserConfig::default())
    }

    fn entries(names: &[&str]) -> Listing {
        Listing::Entries(names.iter().map(|n| HierarchyEntry::directory(*n)).collect())
    }

    fn list_path(ticket: &FetchTicket) -> Option<String> {
        match &ticket.request {
            FetchRequest::List { path, .. } => path.clone(),
            other => panic!("expected a listing request, got {:?}", other),
        }
    }

    #[test]
    fn test_new_browser_is_idle_at_root() {
        let browser = target_browser();
        assert_eq!(browser.state(), LoadState::Idle);
        assert_eq!(browser.breadcrumbs().len(), 1);
        assert_eq!(browser.tip().display_path(), "Root");
        assert!(browser.selected_target().is_none());
    }

    #[test]
    fn test_open_then_load() {
        let mut browser = target_browser();
        let ticket = browser.open();
        assert_eq!(browser.state(), LoadState::Loading);
        assert_eq!(list_path(&ticket), None);

        assert_eq!(browser.apply(ticket.generation, Ok(entries(&["Users"]))), Applied::Current);
        assert_eq!(browser.state(), LoadState::Loaded);
        assert_eq!(browser.listing().len(), 1);
    }

    #[test]
    fn test_descend_from_root_has_no_leading_slash() {
        let mut browser = target_browser();
        let ticket = browser.open();
        browser.apply(ticket.generation, Ok(entries(&["Users"])));

        let users = browser.listing().entry("Users").unwrap().clone();
        let ticket = browser.descend(&users).unwrap().unwrap();

        assert_eq!(browser.breadcrumbs().labels(), vec!["Root", "Users"]);
        assert_eq!(list_path(&ticket), Some("Users".to_string()));
        assert_eq!(browser.selected_target(), Some("Users"));
    }

    #[test]
    fn test_descend_joins_drive_paths() {
        let mut browser = target_browser();
        browser.open();
        let ticket = browser.descend(&HierarchyEntry::directory("C:\\")).unwrap().unwrap();
        assert_eq!(list_path(&ticket), Some("C:".to_string()));

        let ticket = browser.descend(&HierarchyEntry::directory("Users")).unwrap().unwrap();
        assert_eq!(list_path(&ticket), Some("C:/Users".to_string()));
        assert_eq!(browser.tip().display_path(), "C:/Users");
    }

    #[test]
    fn test_absolute_entry_replaces_base() {
        let mut browser = target_browser();
        browser.open();
        browser.descend(&HierarchyEntry::directory("C:")).unwrap();
        let ticket = browser
            .descend(&HierarchyEntry::directory("smb://nas/share"))
            .unwrap()
            .unwrap();
        assert_eq!(list_path(&ticket), Some("smb://nas/share".to_string()));
    }

    #[test]
    fn test_descend_into_file_rejected_for_targets() {
        let mut browser = target_browser();
        browser.open();
        let before = browser.generation();

        let err = browser.descend(&HierarchyEntry::file("a.txt", 3)).unwrap_err();
        assert_eq!(err, BrowseError::NotADirectory("a.txt".to_string()));
        assert_eq!(browser.generation(), before);
        assert_eq!(browser.breadcrumbs().len(), 1);
    }

    #[test]
    fn test_repeated_descend_is_noop() {
        let mut browser = target_browser();
        browser.open();
        browser.descend(&HierarchyEntry::directory("C:")).unwrap();
        let generation = browser.generation();

        // an absolute entry naming the tip itself
        assert!(browser.descend(&HierarchyEntry::directory("C:/")).unwrap().is_none());
        assert_eq!(browser.generation(), generation);
        assert_eq!(browser.breadcrumbs().len(), 2);
    }

    #[test]
    fn test_later_navigation_wins_over_late_result() {
        let mut browser = target_browser();
        browser.open();

        let a = browser.descend(&HierarchyEntry::directory("A")).unwrap().unwrap();
        let b = browser.descend(&HierarchyEntry::directory("B")).unwrap().unwrap();

        assert_eq!(browser.apply(b.generation, Ok(entries(&["from-b"]))), Applied::Current);
        assert_eq!(browser.apply(a.generation, Ok(entries(&["from-a"]))), Applied::Stale);

        assert_eq!(browser.listing(), &entries(&["from-b"]));
        assert_eq!(browser.state(), LoadState::Loaded);
    }

    #[test]
    fn test_early_stale_result_does_not_finish_loading() {
        let mut browser = target_browser();
        browser.open();

        let a = browser.descend(&HierarchyEntry::directory("A")).unwrap().unwrap();
        browser.jump_to(0).unwrap();
        let b = browser.descend(&HierarchyEntry::directory("B")).unwrap().unwrap();

        assert_eq!(browser.apply(a.generation, Ok(entries(&["from-a"]))), Applied::Stale);
        assert_eq!(browser.state(), LoadState::Loading);
        assert!(browser.listing().is_empty());

        browser.apply(b.generation, Ok(entries(&["from-b"])));
        assert_eq!(browser.listing(), &entries(&["from-b"]));
    }

    #[test]
    fn test_stale_failure_is_swallowed() {
        let mut browser = target_browser();
        let root = browser.open();
        let a = browser.descend(&HierarchyEntry::directory("A")).unwrap().unwrap();
        browser.apply(a.generation, Ok(entries(&["x"])));

        let outcome = browser.apply(root.generation, Err(ProviderError::Unavailable("late".into())));
        assert_eq!(outcome, Applied::Stale);
        assert_eq!(browser.state(), LoadState::Loaded);
        assert!(browser.error().is_none());
    }

    #[test]
    fn test_jump_to_root_refetches_with_no_path() {
        let mut browser = target_browser();
        browser.open();
        browser.descend(&HierarchyEntry::directory("C:")).unwrap();
        browser.descend(&HierarchyEntry::directory("Users")).unwrap();

        let ticket = browser.jump_to(0).unwrap();
        assert_eq!(list_path(&ticket), None);
        assert_eq!(browser.breadcrumbs().len(), 1);
        assert_eq!(browser.state(), LoadState::Loading);

        // also from the root itself
        let again = browser.jump_to(0).unwrap();
        assert_eq!(list_path(&again), None);
        assert!(again.generation > ticket.generation);
    }

    #[test]
    fn test_jump_to_middle() {
        let mut browser = target_browser();
        browser.open();
        browser.descend(&HierarchyEntry::directory("C:")).unwrap();
        browser.descend(&HierarchyEntry::directory("Users")).unwrap();
        browser.descend(&HierarchyEntry::directory("alice")).unwrap();

        let ticket = browser.jump_to(1).unwrap();
        assert_eq!(list_path(&ticket), Some("C:".to_string()));
        assert_eq!(browser.breadcrumbs().labels(), vec!["Root", "C:"]);
    }

    #[test]
    fn test_jump_out_of_range_changes_nothing() {
        let mut browser = target_browser();
        browser.open();
        let generation = browser.generation();

        let err = browser.jump_to(3).unwrap_err();
        assert_eq!(err, BrowseError::IndexOutOfRange { index: 3, len: 1 });
        assert_eq!(browser.generation(), generation);
    }

    #[test]
    fn test_failure_keeps_trail_and_clears_listing() {
        let mut browser = target_browser();
        let root = browser.open();
        browser.apply(root.generation, Ok(entries(&["C:"])));
        let c = browser.descend(&HierarchyEntry::directory("C:")).unwrap().unwrap();

        browser.apply(c.generation, Err(ProviderError::Unavailable("agent offline".into())));

        assert_eq!(browser.state(), LoadState::Error);
        assert_eq!(browser.error(), Some("Service unavailable: agent offline"));
        assert!(browser.listing().is_empty());
        assert_eq!(browser.breadcrumbs().labels(), vec!["Root", "C:"]);

        // retry
        let retry = browser.reload();
        assert_eq!(browser.state(), LoadState::Loading);
        assert!(browser.error().is_none());
        assert_eq!(list_path(&retry), Some("C:".to_string()));
        browser.apply(retry.generation, Ok(entries(&["Users"])));
        assert_eq!(browser.state(), LoadState::Loaded);
    }

    #[test]
    fn test_reload_keeps_listing_until_answer() {
        let mut browser = target_browser();
        let root = browser.open();
        browser.apply(root.generation, Ok(entries(&["C:"])));

        let ticket = browser.reload();
        assert_eq!(browser.listing(), &entries(&["C:"]));
        assert_eq!(browser.apply(root.generation, Ok(entries(&["old"]))), Applied::Stale);
        browser.apply(ticket.generation, Ok(entries(&["C:", "D:"])));
        assert_eq!(browser.listing().len(), 2);
    }

    #[test]
    fn test_up() {
        let mut browser = target_browser();
        browser.open();
        assert!(browser.up().is_none());

        browser.descend(&HierarchyEntry::directory("C:")).unwrap();
        let ticket = browser.up().unwrap();
        assert_eq!(list_path(&ticket), None);
        assert!(browser.tip().is_root());
    }

    #[test]
    fn test_only_directories_option() {
        let mut browser = HierarchyBrowser::new(
            BrowseMode::Target(BrowsePurpose::RestoreTarget),
            BrowserConfig::default().with_only_directories(true),
        );
        match browser.open().request {
            FetchRequest::List { purpose, options, .. } => {
                assert_eq!(purpose, BrowsePurpose::RestoreTarget);
                assert!(options.only_directories);
                assert!(options.task_id.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_task_content_file_lists_chunks() {
        let task = TaskId::new("t-1");
        let mut browser = HierarchyBrowser::new(
            BrowseMode::TaskContent(task.clone()),
            BrowserConfig::default().with_root_label("Backup content"),
        );

        match browser.open().request {
            FetchRequest::List { purpose, options, path } => {
                assert_eq!(purpose, BrowsePurpose::TaskContent);
                assert_eq!(options.task_id, Some(task.clone()));
                assert!(path.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }

        browser.descend(&HierarchyEntry::directory("docs")).unwrap();
        let ticket = browser.descend(&HierarchyEntry::file("a.txt", 8192)).unwrap().unwrap();
        assert_eq!(
            ticket.request,
            FetchRequest::Chunks {
                task_id: task.clone(),
                file_path: "docs/a.txt".to_string(),
            }
        );
        assert!(browser.tip().is_leaf);

        let chunk = ChunkEntry {
            chunk_id: "c0".into(),
            sequence: 0,
            size_bytes: 8192,
            status: ChunkStatus::Stored,
        };
        browser.apply(ticket.generation, Ok(Listing::Chunks(vec![chunk])));
        assert_eq!(browser.listing().chunks().len(), 1);
        assert!(browser.listing().entries().is_empty());

        let err = browser.descend(&HierarchyEntry::directory("deeper")).unwrap_err();
        assert_eq!(err, BrowseError::BelowLeaf("a.txt".to_string()));

        assert_eq!(browser.breadcrumbs().labels(), vec!["Backup content", "docs", "a.txt"]);
    }

    #[test]
    fn test_view_wire_shape() {
        let mut browser = target_browser();
        browser.open();

        let json = serde_json::to_value(browser.view()).unwrap();
        assert_eq!(json["state"], "LOADING");
        assert_eq!(json["displayPath"], "Root");
        assert_eq!(json["breadcrumbs"][0]["requestPath"], serde_json::Value::Null);
        assert_eq!(json["listing"]["kind"], "entries");
    }

    #[test]
    fn test_view() {
        let mut browser = target_browser();
        let root = browser.open();
        browser.apply(root.generation, Ok(entries(&["C:"])));

        let view = browser.view();
        assert_eq!(view.display_path, "Root");
        assert_eq!(view.state, LoadState::Loaded);
        assert_eq!(view.breadcrumbs.len(), 1);
        assert!(view.error.is_none());
    }
}
