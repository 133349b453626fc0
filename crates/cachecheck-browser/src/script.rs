//! Page scripts and their evaluation.
//!
//! Every interaction with a page goes through [`ScriptInjector::evaluate`].
//! Scripts mutate the live document on purpose: filling the checker form and
//! clicking its buttons is how a check is started.

use crate::surface::{ScriptValue, Surface};
use crate::{Error, Result};

/// Walks the rows of the listing's log table and returns them as a JSON
/// string. A row that doesn't have the expected shape throws inside its
/// `try` block and is left out.
const LOG_TABLE_SCRIPT: &str = r#"
(function () {
    const rows = Array.from(document.getElementById('cache_logs_table').getElementsByTagName('tr'));
    const logs = [];

    rows.forEach((row) => {
        try {
            const left = row.getElementsByClassName('FloatLeft LogDisplayLeft')[0];
            const right = row.getElementsByClassName('FloatLeft LogDisplayRight')[0];

            const profile = left.children[0];
            const name = profile.innerText;
            const nameId = profile.href.replace('https://www.geocaching.com/profile/?guid=', '');
            const logType = right.getElementsByClassName('log-meta')[0].children[0]
                .attributes.src.textContent
                .replace('/images/logtypes/', '')
                .replace('.png', '');
            const logLink = right.getElementsByClassName('log-cta')[0]
                .getElementsByClassName('AlignRight')[0]
                .getElementsByTagName('a')[0].href;

            logs.push({ name: name, nameId: nameId, logType: parseInt(logType), logLink: logLink });
        } catch (e) {
        }
    });

    return JSON.stringify(logs);
})();
"#;

/// Reads the style of the checker's "challenge fulfilled" marker
const READ_STATUS_SCRIPT: &str =
    "document.getElementById('challengeFulfilled').getAttribute('style');";

pub const PROFILE_INPUT_ID: &str = "profile_name_fill";
pub const RUN_CHECKER_ID: &str = "runChecker";

pub struct ScriptInjector;

impl ScriptInjector {
    /// Evaluate `script` on the surface.
    ///
    /// Any failure reported by the surface is returned as
    /// [`Error::Script`] carrying the underlying message.
    pub async fn evaluate(surface: &dyn Surface, script: &str) -> Result<ScriptValue> {
        tracing::debug!("Evaluating script ({} bytes)", script.len());

        match surface.evaluate(script).await {
            Ok(value) => Ok(value),
            Err(Error::Script(message)) => Err(Error::Script(message)),
            Err(other) => Err(Error::Script(other.to_string())),
        }
    }

    pub fn log_table_script() -> &'static str {
        LOG_TABLE_SCRIPT
    }

    /// Script that enters `username` into the checker form and starts the
    /// checker.
    pub fn fill_and_run_script(username: &str) -> String {
        // A JSON string literal is a valid JS string literal, so quotes and
        // backslashes in nicknames can't break out of the script.
        let literal = serde_json::to_string(username).unwrap_or_else(|_| "\"\"".to_string());

        format!(
            "document.getElementById('{input}').setAttribute('value', {literal});\n\
             document.getElementById('{input}').click();\n\
             document.getElementById('{run}').click();",
            input = PROFILE_INPUT_ID,
            run = RUN_CHECKER_ID,
            literal = literal,
        )
    }

    pub fn read_status_script() -> &'static str {
        READ_STATUS_SCRIPT
    }
}
