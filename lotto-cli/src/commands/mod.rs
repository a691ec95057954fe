pub mod account;
pub mod admin;
pub mod bets;
pub mod draw;

pub use account::{handle_account_command, AccountCommands};
pub use admin::{handle_admin_command, withdraw, AdminCommands};
pub use bets::{list_bets, quick_pick, show_history};
pub use draw::{handle_draw_command, DrawCommands};

use crate::config::CliConfig;
use lotto_core::{DrawEngine, Notifier, SqliteStore};
use std::sync::Arc;

/// Builds an engine over the on-disk store. One-shot commands never open a
/// window, so the default scheduler stays idle.
pub(crate) async fn open_engine(
    config: &CliConfig,
    store: Arc<SqliteStore>,
    notifier: Option<Arc<dyn Notifier>>,
) -> anyhow::Result<DrawEngine> {
    let mut builder = DrawEngine::builder(config.lottery.clone()).store(store);
    if let Some(notifier) = notifier {
        builder = builder.notifier(notifier);
    }
    Ok(builder.build().await?)
}
