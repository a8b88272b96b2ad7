//! Demo catalogue for previews and first runs

use chrono::Utc;
use std::collections::BTreeMap;

use super::launches::insert_launch;
use super::lists::{find_list_id, insert_list};
use super::{NewLaunch, Store};
use crate::api::{LaunchJson, LinksJson};
use crate::error::{Error, Result};
use crate::ui::SilentUi;
use crate::writer::import::write_import;
use crate::writer::ImportReport;

pub const SAMPLE_LIST: &str = "Sample List";

fn starlink_4_11() -> LaunchJson {
    let patch = BTreeMap::from([
        ("small".to_string(), Some("https://imgur.com/BrW201S.png".to_string())),
        ("large".to_string(), Some("https://imgur.com/573IfGk.png".to_string())),
    ]);
    let reddit = BTreeMap::from([
        (
            "campaign".to_string(),
            Some("https://www.reddit.com/r/spacex/comments/jhu37i/starlink_general_discussion_and_deployment_thread/".to_string()),
        ),
        (
            "launch".to_string(),
            Some("https://www.reddit.com/r/spacex/comments/t0yksi/rspacex_starlink_411_launch_discussion_and/".to_string()),
        ),
        ("media".to_string(), None),
        (
            "recovery".to_string(),
            Some("https://www.reddit.com/r/spacex/comments/k2ts1q/rspacex_fleet_updates_discussion_thread/".to_string()),
        ),
    ]);
    let flickr = BTreeMap::from([
        ("small".to_string(), Vec::new()),
        ("original".to_string(), Vec::new()),
    ]);

    LaunchJson {
        id: "61eefaa89eb1064137a1bd73".into(),
        name: "Starlink 4-11 (v1.5)".into(),
        date_utc: "2022-02-25T17:12:00.000Z".into(),
        flight_number: Some(151),
        upcoming: false,
        success: None,
        details: None,
        launchpad: None,
        fairings: None,
        links: Some(LinksJson {
            patch,
            reddit,
            flickr,
            presskit: None,
            webcast: Some("https://youtu.be/nnVOfKOzXHE".into()),
            youtube_id: Some("nnVOfKOzXHE".into()),
            article: None,
            wikipedia: Some("https://en.wikipedia.org/wiki/Starlink".into()),
        }),
    }
}

impl Store {
    /// Create "Sample List" holding ten placeholder launches dated now,
    /// plus the imported Starlink 4-11 record and its links.
    ///
    /// Built in one transaction. Fails with [`Error::DuplicateList`] if the
    /// sample list exists.
    pub fn populate_sample(&mut self) -> Result<ImportReport> {
        let tx = self.transaction()?;
        if find_list_id(&tx, SAMPLE_LIST)?.is_some() {
            return Err(Error::DuplicateList(SAMPLE_LIST.to_string()));
        }
        let list_id = insert_list(&tx, SAMPLE_LIST)?;

        let now = Utc::now();
        for i in 0..10 {
            insert_launch(&tx, &NewLaunch::new(format!("Launch {}", i + 1), now), list_id)?;
        }

        let mut report = write_import(&tx, &[starlink_4_11()], SAMPLE_LIST, &mut SilentUi)?;
        tx.commit()?;

        report.list_members += 10;
        Ok(report)
    }
}
