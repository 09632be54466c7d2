/*!
# Riddhi Siddhi Art Storefront

Browser storefront for a Jaipur marble murti workshop, built in Rust.

## Overview

The page shows a fixed catalog of hand-painted murtis, opens a detail modal
for any product, and hands contact-form inquiries off to WhatsApp. There is
no backend: the only outbound call is a pre-filled `wa.me` link opened in a
new tab.

## Architecture

### Page Controller
- **Technologies**: Rust, WebAssembly (`web` feature)
- **Key Components**:
  - Event Dispatcher - One `dispatch(Event) -> Vec<Effect>` for every DOM role
  - Card Renderer - Builds escaped card views from the catalog
  - Modal State - Closed/open, bound to one product
  - Submission Pipeline - Honeypot, bot, rate, validation, sanitize, screen, hand-off
  - Scroll Coalescing - At most one animation-frame request at a time

### Client-side Guards
The guards below run in the visitor's browser. They tidy honest input and
slow down naive scripts; they are **not** a security boundary.
- Sanitizer - HTML escaping, phone/email cleanup, heuristic blocklists
- Rate Limiter - Sliding windows for renders and form submissions
- Bot Detector - Time-on-page and interaction counters, honeypot fields
- Pseudo-CSRF Token - Session-scoped random token no server ever checks

### Hosts
- `web` - `wasm-bindgen` bridge; a small script applies effects to the DOM
- Tests and the `storefront_test` binary drive the controller in memory
- `preview` binary (`serve` feature) serves `static/` for local viewing

## Modules

- **app**: Page controller, events and effects
- **catalog**: Product records, categories, filters, image fallbacks
- **sanitizer**: Escaping, blocklists, image origin policy
- **validator**: Per-field form rules
- **rate_limiter**: Sliding-window throttles
- **bot_detector**: Interaction heuristics and honeypot check
- **csrf**: Session-scoped pseudo token
- **inquiry**: Submission screening and WhatsApp message
- **config**: Tunable limits and endpoints
- **clock**: Injectable millisecond clock
- **error**: Crate error types
*/

pub mod app;
pub mod bot_detector;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod csrf;
pub mod error;
pub mod inquiry;
pub mod rate_limiter;
pub mod sanitizer;
pub mod validator;
#[cfg(feature = "web")]
pub mod web;

/// Re-export the types a host needs to drive the page
pub use app::{Effect, Event, ModalState, Storefront};
pub use catalog::{Catalog, Category, Filter, ProductRecord, resolve_image};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SiteConfig;
pub use csrf::{MemorySessionStore, SessionStore};
pub use error::{CatalogError, ConfigError, CsrfError};
