mod cli;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use daybook::ai::{apply_suggested_tag, JournalAssistant, OpenAiCompleter};
use daybook::clock::{Clock, SystemClock};
use daybook::config::{AiConfig, AppConfig};
use daybook::geo::{self, NominatimGeocoder};
use daybook::journal::{
    self, parse_tags, start_periodic_sweep, Draft, DraftStore, Entry, EntryFields, EntryFilter,
    JournalStats, LifecycleManager, SelectionSet, TrashEntry,
};
use daybook::store::{KvStore, SqliteStore};

use cli::{Cli, Command, ConfigCommand, DraftCommand, EditArgs, NewArgs, SearchArgs};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli) {
        eprintln!("daybook: {error:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "info,daybook=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a command needs: settings, the opened store and the clock.
struct App {
    config: AppConfig,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    json: bool,
}

impl App {
    fn open(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load()?,
        };
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let db_path = config.database_path();
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("failed to open journal at {}", db_path.display()))?;
        tracing::debug!("Opened journal store at {}", db_path.display());

        Ok(Self {
            config,
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
            json: cli.json,
        })
    }

    fn journal(&self) -> Result<LifecycleManager> {
        LifecycleManager::open_and_sweep(self.store.clone(), self.clock.clone())
            .context("failed to load journal")
    }

    fn assistant(&self) -> Result<JournalAssistant> {
        let ai_config = AiConfig::load(self.store.as_ref())?;
        let completer = OpenAiCompleter::new(
            ai_config,
            self.config.llm_api_url.clone(),
            self.config.llm_timeout(),
        )?;
        Ok(JournalAssistant::new(Arc::new(completer)))
    }

    fn geocoder(&self) -> Result<NominatimGeocoder> {
        Ok(NominatimGeocoder::new(
            self.config.geocoder_url.clone(),
            self.config.geocode_timeout(),
        )?)
    }

    fn drafts(&self) -> DraftStore {
        DraftStore::new(self.store.clone())
    }

    fn print_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn run(cli: Cli) -> Result<()> {
    let app = App::open(&cli)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(dispatch(&app, cli.command))
}

async fn dispatch(app: &App, command: Command) -> Result<()> {
    match command {
        Command::New(args) => new_entry(app, args).await,
        Command::Edit(args) => edit_entry(app, args),
        Command::List => {
            let journal = app.journal()?;
            print_entries(app, journal.entries().list().iter())
        }
        Command::Show { id } => {
            let journal = app.journal()?;
            let entry = journal
                .entries()
                .find(&id)
                .with_context(|| format!("no entry with id {id}"))?;
            if app.json {
                app.print_json(entry)
            } else {
                print_entry_detail(entry);
                Ok(())
            }
        }
        Command::Search(args) => search_entries(app, args),
        Command::Tags => {
            let journal = app.journal()?;
            let tags = journal::all_tags(journal.entries().list());
            if app.json {
                return app.print_json(&tags);
            }
            for tag in tags {
                println!("{tag}");
            }
            Ok(())
        }
        Command::Stats => show_stats(app),
        Command::Delete { ids } => delete_entries(app, ids),
        Command::Trash => show_trash(app),
        Command::Restore { id } => {
            let mut journal = app.journal()?;
            let entry = journal.restore_from_trash(&id)?;
            println!("Restored \"{}\"", entry.title);
            Ok(())
        }
        Command::Purge { id } => {
            let mut journal = app.journal()?;
            journal.trash_mut().purge(&id)?;
            println!("Permanently deleted {id}");
            Ok(())
        }
        Command::EmptyTrash => {
            let mut journal = app.journal()?;
            if journal.trash().is_empty() {
                println!("Trash is already empty");
                return Ok(());
            }
            let count = journal.trash_mut().purge_all()?;
            println!("Permanently deleted {count} entries");
            Ok(())
        }
        Command::Sweep => {
            let mut journal = LifecycleManager::open(app.store.clone(), app.clock.clone())?;
            let removed = journal.sweep_expired()?;
            println!("Removed {removed} expired entries from trash");
            Ok(())
        }
        Command::Watch => watch(app).await,
        Command::Summarize { ids } => summarize(app, ids).await,
        Command::SuggestTags { id, apply } => suggest_tags(app, &id, apply).await,
        Command::Insights => {
            let journal = app.journal()?;
            let insights = app.assistant()?.insights(journal.entries().list()).await?;
            println!("{insights}");
            Ok(())
        }
        Command::Draft(command) => draft(app, command),
        Command::Config(command) => configure(app, command).await,
        Command::Locate { lat, lon } => {
            let geocoder = app.geocoder()?;
            println!("{}", geo::resolve_location(&geocoder, lat, lon).await);
            Ok(())
        }
    }
}

async fn new_entry(app: &App, args: NewArgs) -> Result<()> {
    let drafts = app.drafts();
    let draft = if args.from_draft {
        drafts.load()?.unwrap_or_default()
    } else {
        Draft::default()
    };

    let date = match args.date {
        Some(date) => Some(date),
        None if !draft.date.trim().is_empty() => Some(
            draft
                .date
                .trim()
                .parse()
                .with_context(|| format!("draft has an invalid date: {}", draft.date))?,
        ),
        None => None,
    };

    let location = match (args.location, args.lat, args.lon) {
        (Some(location), _, _) => Some(location),
        (None, Some(lat), Some(lon)) => {
            let geocoder = app.geocoder()?;
            Some(geo::resolve_location(&geocoder, lat, lon).await)
        }
        _ => None,
    };

    let fields = EntryFields {
        title: args.title.unwrap_or(draft.title),
        content: args.content.unwrap_or(draft.content),
        date,
        tags: parse_tags(args.tags.as_deref().unwrap_or(&draft.tags)),
        location,
        photos: Vec::new(),
    };

    let mut journal = app.journal()?;
    let entry = journal.entries_mut().create(fields)?;
    if let Err(e) = drafts.clear() {
        tracing::warn!("Entry saved but the draft could not be cleared: {}", e);
    }

    if app.json {
        return app.print_json(&entry);
    }
    println!("Saved \"{}\" ({} words) as {}", entry.title, entry.word_count, entry.id);
    Ok(())
}

fn edit_entry(app: &App, args: EditArgs) -> Result<()> {
    let mut journal = app.journal()?;
    let current = journal
        .entries()
        .find(&args.id)
        .cloned()
        .with_context(|| format!("no entry with id {}", args.id))?;

    let fields = EntryFields {
        title: args.title.unwrap_or(current.title),
        content: args.content.unwrap_or(current.content),
        date: args.date,
        tags: args.tags.as_deref().map(parse_tags).unwrap_or(current.tags),
        location: args.location.or(current.location),
        photos: current.photos,
    };

    let entry = journal.entries_mut().update(&args.id, fields)?;
    if app.json {
        return app.print_json(&entry);
    }
    println!("Updated \"{}\"", entry.title);
    Ok(())
}

fn search_entries(app: &App, args: SearchArgs) -> Result<()> {
    let journal = app.journal()?;
    let filter = EntryFilter {
        query: args.query,
        tag: args.tag,
        from: args.from,
        to: args.to,
    };
    let results = journal::search(journal.entries().list(), &filter);
    if results.is_empty() && !app.json {
        println!("No results found");
        return Ok(());
    }
    print_entries(app, results.into_iter())
}

fn show_stats(app: &App) -> Result<()> {
    let journal = app.journal()?;
    let entries = journal.entries().list();
    let today = app.clock.today();

    let stats = JournalStats::compute(entries, today);
    let activity = journal::monthly_activity(entries, today.year(), today.month());
    let cloud = journal::tag_cloud(entries, journal::stats::DEFAULT_TAG_CLOUD_SIZE);

    if app.json {
        return app.print_json(&serde_json::json!({
            "stats": stats,
            "monthlyActivity": activity,
            "tagCloud": cloud,
        }));
    }

    println!("Entries:  {}", stats.total_entries);
    println!("Words:    {}", stats.total_words);
    println!("Tags:     {}", stats.total_tags);
    println!("Streak:   {} days", stats.streak_days);
    println!();
    println!("{}:", today.format("%B %Y"));
    for (day, count) in activity.iter().enumerate().filter(|(_, c)| **c > 0) {
        println!("  {:>2}  {}", day + 1, "#".repeat(*count));
    }
    if !cloud.is_empty() {
        println!();
        println!("Top tags:");
        for (tag, count) in cloud {
            println!("  {tag} ({count})");
        }
    }
    Ok(())
}

fn delete_entries(app: &App, ids: Vec<String>) -> Result<()> {
    let mut journal = app.journal()?;
    let mut selection = SelectionSet::new();
    for id in &ids {
        if !selection.contains(id) {
            selection.toggle(id);
        }
    }

    let requested = selection.len();
    let deleted = selection
        .batch_soft_delete(&mut journal)
        .context("batch delete was not saved")?;
    println!("Moved {deleted} entries to trash");
    if deleted < requested {
        println!("{} ids did not match an entry", requested - deleted);
    }
    Ok(())
}

fn show_trash(app: &App) -> Result<()> {
    let journal = app.journal()?;
    let trash = journal.trash().list();
    if app.json {
        return app.print_json(trash);
    }
    if trash.is_empty() {
        println!("Trash is empty. Deleted entries stay here for 30 days.");
        return Ok(());
    }

    let now = app.clock.now();
    for trashed in trash {
        print_trash_line(trashed, (trashed.delete_after - now).num_days());
    }
    Ok(())
}

async fn watch(app: &App) -> Result<()> {
    let manager = Arc::new(Mutex::new(LifecycleManager::open(
        app.store.clone(),
        app.clock.clone(),
    )?));
    let (report_tx, report_rx) = flume::unbounded();
    let every = app.config.sweep_interval();
    let handle = start_periodic_sweep(manager, every, Some(report_tx));

    tracing::info!("Sweeping trash every {} hours; Ctrl-C to stop", every.as_secs() / 3600);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            report = report_rx.recv_async() => match report {
                Ok(report) => match report.outcome {
                    Ok(removed) => println!("{} swept {} expired entries", report.ran_at.to_rfc3339(), removed),
                    Err(reason) => eprintln!("{} sweep failed: {}", report.ran_at.to_rfc3339(), reason),
                },
                Err(_) => break,
            },
        }
    }

    handle.abort();
    Ok(())
}

async fn summarize(app: &App, ids: Vec<String>) -> Result<()> {
    let journal = app.journal()?;
    let (entries, label): (Vec<&Entry>, &str) = if ids.is_empty() {
        (journal.entries().list().iter().collect(), "All Entries")
    } else {
        let mut selection = SelectionSet::new();
        for id in &ids {
            if !selection.contains(id) {
                selection.toggle(id);
            }
        }
        (selection.materialize(journal.entries()), "Selected Entries")
    };

    let summary = app.assistant()?.summarize(&entries, label).await?;
    println!("Summary of {} ({} entries)", summary.label, summary.entry_count);
    println!();
    println!("{}", summary.text);
    Ok(())
}

async fn suggest_tags(app: &App, id: &str, apply: bool) -> Result<()> {
    let mut journal = app.journal()?;
    let entry = journal
        .entries()
        .find(id)
        .cloned()
        .with_context(|| format!("no entry with id {id}"))?;

    let suggested = app.assistant()?.suggest_tags(&entry).await?;
    if !apply {
        println!("{}", suggested.join(", "));
        return Ok(());
    }

    let mut tags = entry.tags.clone();
    let added: Vec<&String> = suggested
        .iter()
        .filter(|tag| apply_suggested_tag(&mut tags, tag))
        .collect();
    if added.is_empty() {
        println!("All suggested tags are already on the entry");
        return Ok(());
    }

    let fields = EntryFields {
        title: entry.title,
        content: entry.content,
        date: Some(entry.date),
        tags,
        location: entry.location,
        photos: entry.photos,
    };
    journal.entries_mut().update(id, fields)?;
    println!(
        "Added tags: {}",
        added.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

fn draft(app: &App, command: DraftCommand) -> Result<()> {
    let drafts = app.drafts();
    match command {
        DraftCommand::Save {
            title,
            content,
            tags,
            date,
        } => {
            drafts.save(&Draft {
                title,
                content,
                tags,
                date,
            })?;
            println!("Draft saved");
        }
        DraftCommand::Show => match drafts.load()? {
            Some(draft) if app.json => app.print_json(&draft)?,
            Some(draft) => {
                println!("Title:   {}", draft.title);
                println!("Date:    {}", draft.date);
                println!("Tags:    {}", draft.tags);
                println!();
                println!("{}", draft.content);
            }
            None => println!("No draft saved"),
        },
        DraftCommand::Clear => {
            drafts.clear()?;
            println!("Draft discarded");
        }
    }
    Ok(())
}

async fn configure(app: &App, command: ConfigCommand) -> Result<()> {
    let store = app.store.as_ref();
    match command {
        ConfigCommand::Show => {
            let ai = AiConfig::load(store)?;
            println!("Database:       {}", app.config.database_path().display());
            println!("Sweep interval: {} hours", app.config.sweep_interval_hours);
            println!("LLM endpoint:   {}", app.config.llm_api_url);
            println!("Model:          {}", ai.model);
            println!("API key:        {}", ai.masked_api_key());
        }
        ConfigCommand::SetKey { api_key } => {
            let mut ai = AiConfig::load(store)?;
            ai.api_key = api_key.trim().to_string();
            ai.save(store)?;
            println!("API key saved");
        }
        ConfigCommand::SetModel { model } => {
            let mut ai = AiConfig::load(store)?;
            ai.model = model.trim().to_string();
            ai.save(store)?;
            println!("Model set to {}", ai.model);
        }
        ConfigCommand::Test => {
            let reply = app.assistant()?.test_connection().await?;
            println!("API connection successful: {reply}");
        }
    }
    Ok(())
}

fn print_entries<'a>(app: &App, entries: impl Iterator<Item = &'a Entry>) -> Result<()> {
    let entries: Vec<&Entry> = entries.collect();
    if app.json {
        return app.print_json(&entries);
    }
    for entry in entries {
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", entry.tags.join(", "))
        };
        println!("{}  {}  {}{}", entry.id, entry.date, entry.title, tags);
    }
    Ok(())
}

fn print_entry_detail(entry: &Entry) {
    println!("{}", entry.title);
    println!("{}", entry.date.format("%B %-d, %Y"));
    if let Some(location) = &entry.location {
        println!("{location}");
    }
    if !entry.tags.is_empty() {
        println!("Tags: {}", entry.tags.join(", "));
    }
    println!();
    println!("{}", entry.content);
    println!();
    println!(
        "{} words, {} photos, updated {}",
        entry.word_count,
        entry.photos.len(),
        entry.updated_at.to_rfc3339()
    );
}

fn print_trash_line(trashed: &TrashEntry, days_left: i64) {
    println!(
        "{}  {}  deleted {}  ({} days left)",
        trashed.id(),
        trashed.entry.title,
        trashed.deleted_at.format("%Y-%m-%d"),
        days_left.max(0)
    );
}
