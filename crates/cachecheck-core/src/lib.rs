pub mod console;
pub mod error;
pub mod record;
pub mod results;
pub mod settings;
pub mod urls;

pub use console::Console;
pub use error::{Error, Result};
pub use record::{LogKind, LogRecord};
pub use results::ResultSet;
pub use settings::Settings;
