//! Multi-phase import of remote launch records.
//!
//! The batch insert path writes flat rows only, so relationships are stitched
//! afterwards:
//! 1. resolve the destination list (it must already exist)
//! 2. batch insert launches
//! 3. batch insert fairings, then link each to its launch by remote id
//! 4. batch insert links, then link each to its launch by remote id
//! 5. add every imported launch to the list
//!
//! All phases share one transaction. A failing phase, or a satellite row left
//! without a launch, aborts the import and leaves the store untouched.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

use super::sqlite::batch_insert;
use crate::api::{FairingsJson, LaunchJson, LinksJson};
use crate::error::{Error, Result};
use crate::parser::{fairings_row, launch_row, links_row, ParsedRow};
use crate::schema::tables::{FAIRINGS, LAUNCHES, LINKS};
use crate::schema::TableSchema;
use crate::store::lists::{add_member, require_list_id};
use crate::store::Store;
use crate::ui::{Phase, Ui};

/// Row counts written by one import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub list: String,
    pub launches: u64,
    pub fairings: u64,
    pub links: u64,
    /// Launches newly added to the list (already-present members are not counted)
    pub list_members: u64,
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} launches, {} fairings, {} links, {} added to list",
            self.list, self.launches, self.fairings, self.links, self.list_members
        )
    }
}

/// Result of a linking pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    pub linked: u64,
    /// Remote ids with no matching launch row
    pub orphaned: Vec<String>,
}

/// A record owned one-to-one by a launch and stored in its own table
pub trait Satellite {
    fn schema() -> &'static TableSchema;
    fn insert_phase() -> Phase;
    fn link_phase() -> Phase;
    fn of(launch: &LaunchJson) -> Option<&Self>;
    fn to_row(&self, id: &str, launch_remote_id: &str) -> Result<ParsedRow>;
}

impl Satellite for FairingsJson {
    fn schema() -> &'static TableSchema {
        &FAIRINGS
    }

    fn insert_phase() -> Phase {
        Phase::InsertingFairings
    }

    fn link_phase() -> Phase {
        Phase::LinkingFairings
    }

    fn of(launch: &LaunchJson) -> Option<&Self> {
        launch.fairings.as_ref()
    }

    fn to_row(&self, id: &str, launch_remote_id: &str) -> Result<ParsedRow> {
        fairings_row(id, launch_remote_id, self)
    }
}

impl Satellite for LinksJson {
    fn schema() -> &'static TableSchema {
        &LINKS
    }

    fn insert_phase() -> Phase {
        Phase::InsertingLinks
    }

    fn link_phase() -> Phase {
        Phase::LinkingLinks
    }

    fn of(launch: &LaunchJson) -> Option<&Self> {
        launch.links.as_ref()
    }

    fn to_row(&self, id: &str, launch_remote_id: &str) -> Result<ParsedRow> {
        links_row(id, launch_remote_id, self)
    }
}

/// Import `launches` into the existing list titled `list_title`.
///
/// A remote id that appears more than once is imported once, from its last
/// occurrence.
pub fn import_launches(
    store: &mut Store,
    launches: &[LaunchJson],
    list_title: &str,
    ui: &mut impl Ui,
) -> Result<ImportReport> {
    let tx = store.transaction()?;
    let report = write_import(&tx, launches, list_title, ui)?;
    tx.commit()?;
    ui.clear_progress();

    debug!(
        list = list_title,
        launches = report.launches,
        fairings = report.fairings,
        links = report.links,
        list_members = report.list_members,
        "Imported launches"
    );
    ui.log(format!("Imported {report}"));
    Ok(report)
}

/// Every import phase inside the caller's transaction; committing is left to the caller
pub(crate) fn write_import(
    tx: &Transaction,
    launches: &[LaunchJson],
    list_title: &str,
    ui: &mut impl Ui,
) -> Result<ImportReport> {
    let list_id = require_list_id(tx, list_title)?;
    let launches = last_by_remote_id(launches);

    ui.set_phase(Phase::InsertingLaunches);
    let rows = launches
        .iter()
        .map(|launch| launch_row(launch))
        .collect::<Result<Vec<_>>>()?;
    let launch_count = batch_insert(tx, &LAUNCHES, &rows, ui)?;

    let fairings = import_satellites::<FairingsJson>(tx, &launches, ui)?;
    let links = import_satellites::<LinksJson>(tx, &launches, ui)?;

    ui.set_phase(Phase::AddingToList);
    let list_members = add_launches_to_list(tx, list_id, &launches)?;

    Ok(ImportReport {
        list: list_title.to_string(),
        launches: launch_count,
        fairings,
        links,
        list_members,
    })
}

/// One record per remote id, the last occurrence winning, in first-seen order
fn last_by_remote_id(launches: &[LaunchJson]) -> Vec<&LaunchJson> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(launches.len());
    let mut distinct: Vec<&LaunchJson> = Vec::with_capacity(launches.len());

    for launch in launches {
        match position.get(launch.id.as_str()) {
            Some(&i) => distinct[i] = launch,
            None => {
                position.insert(launch.id.as_str(), distinct.len());
                distinct.push(launch);
            }
        }
    }

    if distinct.len() < launches.len() {
        debug!(
            repeated = launches.len() - distinct.len(),
            "Collapsed repeated remote ids"
        );
    }
    distinct
}

fn import_satellites<S: Satellite>(
    tx: &Transaction,
    launches: &[&LaunchJson],
    ui: &mut impl Ui,
) -> Result<u64> {
    let schema = S::schema();
    let owned: Vec<(&str, &S)> = launches
        .iter()
        .filter_map(|launch| S::of(launch).map(|s| (launch.id.as_str(), s)))
        .collect();

    ui.set_phase(S::insert_phase());
    let rows = owned
        .iter()
        .map(|(remote_id, satellite)| satellite.to_row(&Uuid::new_v4().to_string(), remote_id))
        .collect::<Result<Vec<_>>>()?;
    let inserted = batch_insert(tx, schema, &rows, ui)?;

    ui.set_phase(S::link_phase());
    let remote_ids: Vec<&str> = owned.iter().map(|(remote_id, _)| *remote_id).collect();
    let outcome = link_satellites(tx, schema, &remote_ids, ui)?;

    if !outcome.orphaned.is_empty() {
        warn!(
            table = schema.name,
            orphaned = outcome.orphaned.len(),
            "Satellite rows without a launch"
        );
        return Err(Error::UnlinkedRecords {
            table: schema.name,
            remote_ids: outcome.orphaned,
        });
    }

    Ok(inserted)
}

/// Point each satellite row keyed by `remote_ids` at its launch.
///
/// Rows whose launch cannot be found are reported in
/// [`LinkOutcome::orphaned`] and left unlinked.
pub fn link_satellites(
    conn: &Connection,
    schema: &TableSchema,
    remote_ids: &[&str],
    ui: &mut impl Ui,
) -> Result<LinkOutcome> {
    let mut find_launch = conn.prepare_cached("SELECT id FROM launches WHERE remote_id = ?1")?;
    let mut link = conn.prepare_cached(&format!(
        "UPDATE {} SET launch_id = ?1 WHERE launch_remote_id = ?2",
        schema.name
    ))?;

    let mut seen = HashSet::new();
    let mut outcome = LinkOutcome::default();
    let total = remote_ids.len() as u64;

    for (i, remote_id) in remote_ids.iter().enumerate() {
        if seen.insert(*remote_id) {
            let launch_id: Option<i64> = find_launch
                .query_row([remote_id], |row| row.get(0))
                .optional()?;

            match launch_id {
                Some(launch_id) => {
                    link.execute(params![launch_id, remote_id])?;
                    outcome.linked += 1;
                }
                None => outcome.orphaned.push(remote_id.to_string()),
            }
        }
        ui.set_progress(i as u64 + 1, total, schema.name);
    }

    debug!(
        table = schema.name,
        linked = outcome.linked,
        orphaned = outcome.orphaned.len(),
        "Linked satellite rows"
    );
    Ok(outcome)
}

fn add_launches_to_list(conn: &Connection, list_id: i64, launches: &[&LaunchJson]) -> Result<u64> {
    let mut find_launch = conn.prepare_cached("SELECT id FROM launches WHERE remote_id = ?1")?;
    let mut added = 0;

    for launch in launches {
        let launch_id: i64 = find_launch.query_row([&launch.id], |row| row.get(0))?;
        if add_member(conn, launch_id, list_id)? {
            added += 1;
        }
    }

    Ok(added)
}
