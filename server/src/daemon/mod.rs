use std::time::Duration;

pub mod feed_sync;

pub(crate) const DAEMON_IDLE_SLEEP: Duration = Duration::from_secs(15 * 60);
