#![allow(dead_code)]

use cachecheck_browser::{Error, Result, ScriptValue, Surface};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const LISTING_URL: &str = "https://www.geocaching.com/geocache/GC8ABCD";
pub const CHECKER_URL: &str = "https://project-gc.com/Challenges/GC8ABCD/12345";

/// In-memory stand-in for a browser page.
///
/// Recognises the pipeline's scripts by the element ids they touch and
/// answers from canned data. Every evaluation is recorded as `fill:<name>`,
/// `read:<name>` or `logs`.
pub struct FakeSurface {
    url: Mutex<Option<String>>,
    log_table: Mutex<std::result::Result<ScriptValue, String>>,
    statuses: Mutex<HashMap<String, String>>,
    failing_fills: Mutex<HashSet<String>>,
    current_user: Mutex<Option<String>>,
    evaluations: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
    eval_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSurface {
    pub fn new(url: &str) -> Self {
        Self::with_eval_delay(url, Duration::ZERO)
    }

    pub fn with_eval_delay(url: &str, eval_delay: Duration) -> Self {
        Self {
            url: Mutex::new(Some(url.to_string())),
            log_table: Mutex::new(Ok(ScriptValue::String("[]".to_string()))),
            statuses: Mutex::new(HashMap::new()),
            failing_fills: Mutex::new(HashSet::new()),
            current_user: Mutex::new(None),
            evaluations: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
            eval_delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = Some(url.to_string());
    }

    pub fn set_log_table(&self, json: &str) {
        *self.log_table.lock().unwrap() = Ok(ScriptValue::String(json.to_string()));
    }

    pub fn fail_log_table(&self, message: &str) {
        *self.log_table.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_status(&self, user: &str, style: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(user.to_string(), style.to_string());
    }

    pub fn fail_fill_for(&self, user: &str) {
        self.failing_fills.lock().unwrap().insert(user.to_string());
    }

    pub fn evaluations(&self) -> Vec<String> {
        self.evaluations.lock().unwrap().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, script: &str) -> Result<ScriptValue> {
        if script.contains("cache_logs_table") {
            self.evaluations.lock().unwrap().push("logs".to_string());
            return self.log_table.lock().unwrap().clone().map_err(Error::Script);
        }

        if script.contains("profile_name_fill") {
            let user = username_from(script);
            self.evaluations.lock().unwrap().push(format!("fill:{}", user));
            if self.failing_fills.lock().unwrap().contains(&user) {
                return Err(Error::Script("TypeError: null is not an object".to_string()));
            }
            *self.current_user.lock().unwrap() = Some(user);
            return Ok(ScriptValue::Null);
        }

        if script.contains("challengeFulfilled") {
            let user = self.current_user.lock().unwrap().clone().unwrap_or_default();
            self.evaluations.lock().unwrap().push(format!("read:{}", user));
            return Ok(self
                .statuses
                .lock()
                .unwrap()
                .get(&user)
                .cloned()
                .map_or(ScriptValue::Null, ScriptValue::String));
        }

        Ok(ScriptValue::Null)
    }
}

#[async_trait::async_trait]
impl Surface for FakeSurface {
    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn evaluate(&self, script: &str) -> Result<ScriptValue> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.eval_delay.is_zero() {
            tokio::time::sleep(self.eval_delay).await;
        }
        let answer = self.answer(script);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        self.set_url(url);
        Ok(())
    }
}

/// Pull the JSON string literal out of `setAttribute('value', "<name>")`
fn username_from(script: &str) -> String {
    let start = script.find("'value', ").expect("fill script sets value") + "'value', ".len();
    let rest = &script[start..];
    let end = rest.find(");").expect("fill script closes setAttribute");
    serde_json::from_str(&rest[..end]).expect("username is a JSON string literal")
}

/// Log table JSON for `(name, id, log type code)` rows
pub fn log_table(rows: &[(&str, &str, i64)]) -> String {
    let rows: Vec<serde_json::Value> = rows
        .iter()
        .map(|(name, id, code)| {
            serde_json::json!({
                "name": name,
                "nameId": id,
                "logType": code,
                "logLink": format!("https://www.geocaching.com/live/log/{}", id),
            })
        })
        .collect();
    serde_json::Value::Array(rows).to_string()
}
