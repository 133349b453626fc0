//! Browser automation pipeline: read found logs from a geocache listing and
//! run each logger through a project-gc challenge checker, one at a time, on
//! a single shared browser page.

mod cdp_session;
mod chrome_finder;
mod error;
mod launcher;
mod profile;

pub mod extractor;
pub mod queue;
pub mod script;
pub mod session;
pub mod surface;
pub mod task;

pub use cdp_session::ChromeSurface;
pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use extractor::LogExtractor;
pub use launcher::{ChromeLauncher, DEFAULT_DEBUGGING_PORT};
pub use profile::ProfileManager;
pub use queue::TaskQueue;
pub use script::ScriptInjector;
pub use session::{CheckSession, SessionEvent};
pub use surface::{ScriptValue, Surface};
pub use task::{classify, CheckTask, TaskState};
