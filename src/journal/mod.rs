//! Journal entries, the trash and the moves between them.

pub mod draft;
pub mod entries;
pub mod entry;
pub mod lifecycle;
pub mod search;
pub mod selection;
pub mod stats;
pub mod trash;

pub use draft::{Draft, DraftStore};
pub use entries::EntryRepository;
pub use entry::{parse_tags, word_count, Entry, EntryFields, Photo, TrashEntry, TRASH_RETENTION_DAYS};
pub use lifecycle::{start_periodic_sweep, LifecycleManager, SweepReport, DEFAULT_SWEEP_INTERVAL};
pub use search::{all_tags, search, EntryFilter};
pub use selection::SelectionSet;
pub use stats::{monthly_activity, streak_days, tag_cloud, JournalStats};
pub use trash::TrashRepository;
