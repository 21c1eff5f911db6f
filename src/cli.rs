use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "daybook",
    version,
    about = "A private journal with a 30-day trash and optional AI analysis"
)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Log debug output to stderr")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Config file (defaults to $DAYBOOK_CONFIG or the user config dir)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Write a new entry")]
    New(NewArgs),

    #[command(about = "Replace the fields of an entry")]
    Edit(EditArgs),

    #[command(about = "List entries, newest first")]
    List,

    #[command(about = "Show one entry")]
    Show { id: String },

    #[command(about = "Search entries by text, tag and date range")]
    Search(SearchArgs),

    #[command(about = "List every tag in use")]
    Tags,

    #[command(about = "Totals, streak, this month's activity and top tags")]
    Stats,

    #[command(about = "Move one or more entries to the trash")]
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    #[command(about = "List trashed entries")]
    Trash,

    #[command(about = "Restore an entry from the trash")]
    Restore { id: String },

    #[command(about = "Permanently delete one trashed entry")]
    Purge { id: String },

    #[command(about = "Permanently delete everything in the trash")]
    EmptyTrash,

    #[command(about = "Remove trashed entries past their 30 days")]
    Sweep,

    #[command(about = "Keep sweeping the trash on a schedule until Ctrl-C")]
    Watch,

    #[command(about = "Summarize the given entries (all entries when none given)")]
    Summarize { ids: Vec<String> },

    #[command(about = "Ask for tag suggestions for an entry")]
    SuggestTags {
        id: String,
        #[arg(long, help = "Add the suggested tags to the entry")]
        apply: bool,
    },

    #[command(about = "Insights on your recent writing")]
    Insights,

    #[command(subcommand, about = "Manage the unsaved draft")]
    Draft(DraftCommand),

    #[command(subcommand, about = "Show or change settings")]
    Config(ConfigCommand),

    #[command(about = "Look up a place name for coordinates")]
    Locate {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Args)]
pub struct NewArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub content: Option<String>,

    #[arg(long, help = "Entry date (YYYY-MM-DD), defaults to today")]
    pub date: Option<NaiveDate>,

    #[arg(long, help = "Comma-separated tags")]
    pub tags: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long, requires = "lon", allow_hyphen_values = true, help = "Latitude to look up as the location")]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true, help = "Longitude to look up as the location")]
    pub lon: Option<f64>,

    #[arg(long, help = "Fill missing fields from the saved draft")]
    pub from_draft: bool,
}

#[derive(Args)]
pub struct EditArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub content: Option<String>,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long, help = "Comma-separated tags, replacing the current ones")]
    pub tags: Option<String>,

    #[arg(long, help = "New location; an empty string clears it")]
    pub location: Option<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    pub query: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub from: Option<NaiveDate>,

    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum DraftCommand {
    #[command(about = "Save (overwrite) the draft")]
    Save {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long, default_value = "")]
        date: String,
    },

    #[command(about = "Show the draft")]
    Show,

    #[command(about = "Discard the draft")]
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Show current settings")]
    Show,

    #[command(about = "Store the language-model API key")]
    SetKey { api_key: String },

    #[command(about = "Choose the language model")]
    SetModel { model: String },

    #[command(about = "Check that the API key works")]
    Test,
}
