pub(crate) mod dispatcher;
pub(crate) mod logging;
pub(crate) mod server;
pub(crate) mod shutdown;
pub(crate) mod watcher;

pub(crate) use dispatcher::Dispatcher;
pub(crate) use logging::init_tracing;
pub(crate) use server::{serve, Deadlines};
pub(crate) use shutdown::ServerTasks;
pub(crate) use watcher::spawn_status_watcher;
