pub mod url;

pub use self::url::{QuerySnapshot, UrlCarrier};

use std::collections::HashMap;

/// A flat string-keyed store that trace context can be written to and read from.
///
/// Writes take `&self` so a carrier can be shared between threads; implementors
/// that need it provide their own synchronization.
pub trait TextMapCarrier {
    /// Value stored under `key`, or an empty string when absent.
    fn get(&self, key: &str) -> String;

    fn set(&self, key: &str, value: &str);

    /// Names currently present, in no particular order.
    fn keys(&self) -> Vec<String>;
}

/// Header-style map: keys are case-insensitive and stored lowercased.
impl TextMapCarrier for parking_lot::RwLock<HashMap<String, String>> {
    fn get(&self, key: &str) -> String {
        self.read()
            .get(&key.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn set(&self, key: &str, value: &str) {
        self.write().insert(key.to_lowercase(), value.to_string());
    }

    fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }
}
