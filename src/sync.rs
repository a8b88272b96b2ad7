//! Fetch remote feeds and import each into its list

use tracing::{error, info};

use crate::api::{Feed, LaunchSource};
use crate::error::Result;
use crate::store::Store;
use crate::ui::{Phase, Ui};
use crate::writer::{import_launches, ImportReport};

#[derive(Debug)]
pub struct FeedOutcome {
    pub feed: Feed,
    pub result: Result<ImportReport>,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Standard lists created by this run
    pub created_lists: Vec<String>,
    pub feeds: Vec<FeedOutcome>,
}

impl SyncReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (Feed, &ImportReport)> {
        self.feeds
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.feed, r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (Feed, &crate::Error)> {
        self.feeds
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.feed, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn total_launches(&self) -> u64 {
        self.succeeded().map(|(_, r)| r.launches).sum()
    }
}

/// Sync `feeds` from `source` into the store.
///
/// The standard lists are created first. A feed that fails to fetch or import
/// is logged and recorded; the remaining feeds still run. Only a failure to
/// create the lists is returned as an error.
pub fn sync(
    store: &mut Store,
    source: &mut impl LaunchSource,
    feeds: &[Feed],
    ui: &mut impl Ui,
) -> Result<SyncReport> {
    let created_lists = store.ensure_lists(&Feed::standard_lists())?;
    let mut report = SyncReport {
        created_lists,
        feeds: Vec::with_capacity(feeds.len()),
    };

    for &feed in feeds {
        ui.set_phase(Phase::Fetching);
        ui.set_info(format!("Feed: {}", feed.list_title()));

        let result = source
            .fetch(feed)
            .and_then(|launches| {
                info!(feed = %feed, launches = launches.len(), "Importing feed");
                import_launches(store, &launches, feed.list_title(), ui)
            });

        if let Err(e) = &result {
            error!(feed = %feed, error = %e, "Feed sync failed");
            ui.log(format!("{} failed: {e}", feed.list_title()));
        }
        report.feeds.push(FeedOutcome { feed, result });
    }

    ui.set_phase(Phase::Complete);
    ui.clear_progress();
    Ok(report)
}
