#![cfg(not(tarpaulin_include))]

//! wasm-bindgen bridge.
//!
//! The page script forwards DOM events as JSON to [`StorefrontApp::dispatch`]
//! and applies the JSON effect list it gets back. Browser globals are reached
//! through `js_sys::Reflect` so no DOM bindings are needed.

use js_sys::{Function, Reflect};
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::app::{Effect, Event, Storefront};
use crate::catalog::Catalog;
use crate::clock::SystemClock;
use crate::config::SiteConfig;
use crate::csrf::{SessionStore, TOKEN_KEY};

fn global_property(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn call_method(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let func: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;
    match args {
        [] => func.call0(target),
        [a] => func.call1(target, a),
        [a, b] => func.call2(target, a, b),
        _ => Err(JsValue::from_str("too many arguments")),
    }
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// `window.sessionStorage`; silently inert when storage is blocked
pub struct BrowserSessionStore {
    storage: Option<JsValue>,
}

impl BrowserSessionStore {
    pub fn new() -> Self {
        BrowserSessionStore {
            storage: global_property(&js_sys::global(), "sessionStorage"),
        }
    }
}

impl Default for BrowserSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for BrowserSessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        call_method(storage, "getItem", &[JsValue::from_str(key)])
            .ok()
            .and_then(|v| v.as_string())
    }

    fn set_item(&mut self, key: &str, value: &str) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(e) = call_method(
                storage,
                "setItem",
                &[JsValue::from_str(key), JsValue::from_str(value)],
            ) {
                log::warn!("sessionStorage.setItem({}) failed: {:?}", key, e);
            }
        }
    }
}

/// Forwards `log` records to the browser console
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(console) = global_property(&js_sys::global(), "console") else {
            return;
        };
        let method = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug | Level::Trace => "debug",
        };
        let line = JsValue::from_str(&format!("{}", record.args()));
        let _ = call_method(&console, method, &[line]);
    }

    fn flush(&self) {}
}

fn init_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

fn page_hostname() -> Option<String> {
    let location = global_property(&js_sys::global(), "location")?;
    global_property(&location, "hostname")?.as_string()
}

fn effects_json(effects: &[Effect]) -> Result<String, JsValue> {
    serde_json::to_string(effects).map_err(to_js)
}

/// The storefront as seen from page script
#[wasm_bindgen]
pub struct StorefrontApp {
    inner: Storefront<BrowserSessionStore, SystemClock>,
}

#[wasm_bindgen]
impl StorefrontApp {
    /// `configJson` overrides individual [`SiteConfig`] fields
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<StorefrontApp, JsValue> {
        init_logging();

        let mut config = match config_json {
            Some(json) => SiteConfig::from_json(&json).map_err(to_js)?,
            None => SiteConfig::default(),
        };
        if let Some(host) = page_hostname().filter(|h| !h.is_empty()) {
            config.page_host = host;
        }

        Ok(StorefrontApp {
            inner: Storefront::new(
                config,
                Catalog::builtin(),
                BrowserSessionStore::new(),
                SystemClock,
            ),
        })
    }

    /// Effects for page load, as a JSON array
    pub fn start(&mut self) -> Result<String, JsValue> {
        effects_json(&self.inner.start())
    }

    /// Handle one JSON-encoded event and return the JSON effect list
    pub fn dispatch(&mut self, event_json: &str) -> Result<String, JsValue> {
        let event: Event = serde_json::from_str(event_json).map_err(to_js)?;
        effects_json(&self.inner.dispatch(event))
    }

    #[wasm_bindgen(js_name = validateToken)]
    pub fn validate_token(&self, candidate: &str) -> bool {
        self.inner.csrf().validate_token(candidate)
    }

    #[wasm_bindgen(js_name = tokenKey)]
    pub fn token_key() -> String {
        TOKEN_KEY.to_string()
    }
}
