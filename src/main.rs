use anyhow::{bail, Context, Result};
use rocket_launches::{
    api::{parse_launches, CachedSource, Feed, LaunchSource, ResponseCache, SpaceXClient},
    cli::{Cli, Commands},
    config::Config,
    logging::{init_logging, Verbosity},
    parser::parse_launch_date,
    store::{LaunchQuery, NewLaunch, Store},
    sync::{sync, SyncReport},
    ui::{LogUi, UiApp},
    writer::import_launches,
};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log lines would tear the full-screen display
    let verbosity = match cli.command {
        Commands::Sync { tui: true, .. } => Verbosity::Quiet,
        _ => cli.verbosity(),
    };
    init_logging(verbosity);

    let config = Config::load_from(cli.config.clone()).context("Failed to load configuration")?;
    let db_path = cli.database.clone().unwrap_or_else(|| config.database_path());
    let mut store =
        Store::open(&db_path).with_context(|| format!("Failed to open {}", db_path.display()))?;

    match cli.command {
        Commands::Sync {
            feed,
            offline,
            clear_cache,
            tui,
        } => {
            let start = Instant::now();
            let feeds = feed.unwrap_or_else(|| Feed::ALL.to_vec());
            let cache = ResponseCache::new(config.storage.cache_dir.clone())?;
            if clear_cache {
                let removed = cache.clear().context("Failed to clear the response cache")?;
                println!("Removed {removed} cached feeds");
            }

            let report = if offline {
                run_sync(&mut store, &mut CachedSource::new(cache), &feeds, tui)?
            } else {
                let mut client = SpaceXClient::new(&config.api)?.with_cache(cache);
                run_sync(&mut store, &mut client, &feeds, tui)?
            };
            store.optimize()?;

            for list in &report.created_lists {
                println!("Created list {list}");
            }
            for (_, imported) in report.succeeded() {
                println!("  {imported}");
            }
            for (feed, e) in report.failed() {
                println!("  {} failed: {e}", feed.list_title());
            }
            println!(
                "\nSynced {} launches into {:?} in {:.1}s",
                report.total_launches(),
                db_path,
                start.elapsed().as_secs_f64()
            );

            let failed = report.failed().count();
            if failed > 0 {
                bail!("{failed} of {} feeds failed", feeds.len());
            }
        }

        Commands::Import { file, list } => {
            let start = Instant::now();
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let launches = parse_launches(&body)
                .with_context(|| format!("{} is not a launch feed", file.display()))?;

            let report = import_launches(&mut store, &launches, &list, &mut LogUi)?;
            store.optimize()?;
            println!("Imported {report} in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::Lists => {
            for list in store.lists()? {
                println!("  {:<24} {:>6}", list.title, list.launch_count);
            }
        }

        Commands::CreateList { title } => {
            let list = store.create_list(&title)?;
            println!("Created list {} ({})", list.title, list.id);
        }

        Commands::Launches {
            list,
            unviewed,
            sort,
        } => {
            let launches = store.launches(&LaunchQuery {
                list,
                unviewed_only: unviewed,
                order: sort,
            })?;
            for launch in &launches {
                println!(
                    "{:>6}  {}  {}  {}",
                    launch.id,
                    launch.launch_date.format("%Y-%m-%d %H:%M"),
                    if launch.is_viewed { "x" } else { " " },
                    launch.name
                );
            }
            println!("\n{} launches", launches.len());
        }

        Commands::Show { id } => {
            let detail = store.launch_detail(id)?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }

        Commands::Add {
            name,
            date,
            list,
            launchpad,
            notes,
            tag,
            viewed,
        } => {
            let mut launch = NewLaunch::new(name, parse_launch_date(&date)?);
            launch.launchpad = launchpad;
            launch.notes = notes;
            launch.tags = tag;
            launch.is_viewed = viewed;

            let id = store.create_launch(&launch, &list)?;
            println!("Added launch {id} to {list}");
        }

        Commands::Tag { id, tags } => {
            let applied = store.tag_launch(id, &tags)?;
            println!("Tagged launch {id}: {}", applied.join(", "));
        }

        Commands::Untag { id, tags } => {
            for tag in &tags {
                if store.untag_launch(id, tag)? {
                    println!("Removed {tag} from launch {id}");
                } else {
                    println!("Launch {id} is not tagged {tag}");
                }
            }
        }

        Commands::AddToList { id, list } => {
            if store.add_to_list(id, &list)? {
                println!("Added launch {id} to {list}");
            } else {
                println!("Launch {id} is already in {list}");
            }
        }

        Commands::MarkViewed { id, unviewed } => {
            store.mark_viewed(id, !unviewed)?;
            let state = if unviewed { "unviewed" } else { "viewed" };
            println!("Marked launch {id} {state}");
        }

        Commands::Tags => {
            for tag in store.tags()? {
                println!("  {:<24} {:>6}", tag.title, tag.launch_count);
            }
        }

        Commands::Sample => {
            let report = store.populate_sample()?;
            println!("Created {report}");
        }
    }

    Ok(())
}

fn run_sync(
    store: &mut Store,
    source: &mut impl LaunchSource,
    feeds: &[Feed],
    tui: bool,
) -> Result<SyncReport> {
    if !tui {
        return Ok(sync(store, source, feeds, &mut LogUi)?);
    }

    let mut ui = UiApp::new()?;
    match sync(store, source, feeds, &mut ui) {
        Ok(report) => {
            let summary = format!(
                "Synced {} launches; {} feeds failed",
                report.total_launches(),
                report.failed().count()
            );
            ui.finish(&summary)?;
            Ok(report)
        }
        Err(e) => {
            ui.restore()?;
            Err(e.into())
        }
    }
}
