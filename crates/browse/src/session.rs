//! Async driver for a [`HierarchyBrowser`].

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;
use vaultview_core::HierarchyEntry;
use vaultview_provider::{HierarchyProvider, ProviderError};

use crate::browser::{
    Applied, BrowseMode, BrowserConfig, BrowserView, FetchRequest, FetchTicket, HierarchyBrowser,
    Listing,
};
use crate::error::Result;

type Outcome = (u64, std::result::Result<Listing, ProviderError>);

/// Owns a browser, runs its fetches and publishes its view.
///
/// Navigation never waits for the provider: each fetch runs on its own task
/// and reports back through a channel, and results are applied only by
/// [`next_outcome`](Self::next_outcome) on the owner's side. The browser is
/// therefore touched by a single writer and needs no lock.
pub struct BrowserSession<P: HierarchyProvider + ?Sized + 'static> {
    provider: Arc<P>,
    browser: HierarchyBrowser,
    results_tx: mpsc::UnboundedSender<Outcome>,
    results_rx: mpsc::UnboundedReceiver<Outcome>,
    view_tx: watch::Sender<BrowserView>,
    in_flight: usize,
}

impl<P: HierarchyProvider + ?Sized + 'static> BrowserSession<P> {
    /// Create a session; nothing is fetched until [`open`](Self::open).
    pub fn new(provider: Arc<P>, mode: BrowseMode, config: BrowserConfig) -> Self {
        let browser = HierarchyBrowser::new(mode, config);
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(browser.view());
        Self {
            provider,
            browser,
            results_tx,
            results_rx,
            view_tx,
            in_flight: 0,
        }
    }

    /// Observe the view.
    pub fn subscribe(&self) -> watch::Receiver<BrowserView> {
        self.view_tx.subscribe()
    }

    /// The underlying browser.
    pub fn browser(&self) -> &HierarchyBrowser {
        &self.browser
    }

    /// Fetches not yet reported back.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Load the root.
    pub fn open(&mut self) {
        let ticket = self.browser.open();
        self.dispatch(ticket);
    }

    /// Move into an entry of the current listing.
    pub fn descend(&mut self, entry: &HierarchyEntry) -> Result<()> {
        if let Some(ticket) = self.browser.descend(entry)? {
            self.dispatch(ticket);
        }
        Ok(())
    }

    /// Go back to trail position `index`.
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        let ticket = self.browser.jump_to(index)?;
        self.dispatch(ticket);
        Ok(())
    }

    /// Go to the parent; returns false at the root.
    pub fn up(&mut self) -> bool {
        match self.browser.up() {
            Some(ticket) => {
                self.dispatch(ticket);
                true
            }
            None => false,
        }
    }

    /// Fetch the tip again (also the retry after an error).
    pub fn reload(&mut self) {
        let ticket = self.browser.reload();
        self.dispatch(ticket);
    }

    /// Wait for the next fetch to report and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<Applied> {
        if self.in_flight == 0 {
            return None;
        }

        // the session keeps a sender, so the channel never closes here
        let (generation, outcome) = self.results_rx.recv().await?;
        self.in_flight -= 1;

        let applied = self.browser.apply(generation, outcome);
        if applied == Applied::Current {
            self.publish();
        }
        Some(applied)
    }

    /// Apply outcomes until no fetch is in flight.
    pub async fn settle(&mut self) {
        while self.next_outcome().await.is_some() {}
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        let provider = Arc::clone(&self.provider);
        let results = self.results_tx.clone();
        self.in_flight += 1;

        debug!("Fetching {:?} (generation {})", ticket.request, ticket.generation);
        tokio::spawn(async move {
            let outcome = match ticket.request {
                FetchRequest::List { path, purpose, options } => provider
                    .list(path.as_deref(), purpose, options)
                    .await
                    .map(Listing::Entries),
                FetchRequest::Chunks { task_id, file_path } => provider
                    .list_chunks(&task_id, &file_path)
                    .await
                    .map(Listing::Chunks),
            };
            // receiver gone means the session was dropped
            let _ = results.send((ticket.generation, outcome));
        });

        self.publish();
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.browser.view());
    }
}
