pub mod cli;
pub mod download;
pub mod filter;
pub mod loader;
pub mod parser;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use loader::{DataDict, DataLoader};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
