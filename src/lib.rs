pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod schema;
pub mod store;
pub mod sync;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{Error, Result};
pub use store::Store;
pub use sync::{sync, SyncReport};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
pub use writer::{import_launches, ImportReport};
