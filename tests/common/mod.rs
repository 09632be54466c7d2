#![allow(dead_code)]

use std::collections::HashMap;

use storefront::app::{CardView, Effect, Event, ModalView, Storefront};
use storefront::bot_detector::{HoneypotFields, Interaction};
use storefront::catalog::Catalog;
use storefront::clock::{Clock, ManualClock};
use storefront::config::SiteConfig;
use storefront::csrf::{MemorySessionStore, SessionStore, TOKEN_KEY};
use storefront::inquiry::InquiryForm;
use storefront::validator::Field;

pub const LOAD_TIME_MS: u64 = 1_700_000_000_000;

/// In-memory page that applies effects the way the browser host does
pub struct HeadlessPage {
    pub app: Storefront<MemorySessionStore, ManualClock>,
    pub clock: ManualClock,
    pub cards: Vec<CardView>,
    pub modal: Option<ModalView>,
    pub scroll_locked: bool,
    pub focused_close: bool,
    pub field_errors: HashMap<Field, String>,
    pub alerts: Vec<String>,
    pub submit_disabled: bool,
    pub submit_label: String,
    pub opened: Vec<(String, String)>,
    pub timers: Vec<u64>,
    pub form: InquiryForm,
    pub honeypot: HoneypotFields,
    pub token_field: String,
    pub active_filter: String,
    pub year: Option<i32>,
    pub default_prevented: bool,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::with_config(SiteConfig::default())
    }

    pub fn with_config(config: SiteConfig) -> Self {
        let clock = ManualClock::new(LOAD_TIME_MS);
        let app = Storefront::new(
            config,
            Catalog::builtin(),
            MemorySessionStore::default(),
            clock.clone(),
        );
        let mut page = HeadlessPage {
            app,
            clock,
            cards: Vec::new(),
            modal: None,
            scroll_locked: false,
            focused_close: false,
            field_errors: HashMap::new(),
            alerts: Vec::new(),
            submit_disabled: false,
            submit_label: "Send via WhatsApp".to_string(),
            opened: Vec::new(),
            timers: Vec::new(),
            form: InquiryForm::default(),
            honeypot: HoneypotFields::default(),
            token_field: String::new(),
            active_filter: "all".to_string(),
            year: None,
            default_prevented: false,
        };
        let effects = page.app.start();
        page.apply(effects);
        page
    }

    pub fn send(&mut self, event: Event) -> Vec<Effect> {
        self.default_prevented = false;
        let effects = self.app.dispatch(event);
        self.apply(effects.clone());
        effects
    }

    /// Advance time and fire any timers that came due
    pub fn advance(&mut self, ms: u64) {
        self.clock.advance(ms);
        let now = self.clock.now_ms();
        let (due, pending): (Vec<u64>, Vec<u64>) =
            self.timers.iter().partition(|&&at| at <= now);
        self.timers = pending;
        for _ in due {
            self.send(Event::ResetTimerFired);
        }
    }

    pub fn act_human(&mut self) {
        self.send(Event::Interaction {
            kind: Interaction::MouseMove,
        });
        self.send(Event::Interaction {
            kind: Interaction::KeyDown,
        });
    }

    pub fn fill(&mut self, name: &str, phone: &str, email: &str, message: &str) {
        self.form = InquiryForm {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        };
    }

    pub fn submit(&mut self) -> Vec<Effect> {
        let event = Event::Submit {
            form: self.form.clone(),
            honeypot: self.honeypot.clone(),
        };
        self.send(event)
    }

    pub fn stored_token(&self) -> Option<String> {
        self.app.csrf().store().get_item(TOKEN_KEY)
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RenderCards { cards } => self.cards = cards,
                Effect::SetActiveFilter { filter } => self.active_filter = filter,
                Effect::ShowModal { modal } => {
                    self.modal = Some(modal);
                    self.scroll_locked = true;
                }
                Effect::HideModal => {
                    self.modal = None;
                    self.scroll_locked = false;
                    self.focused_close = false;
                }
                Effect::FocusModalClose => self.focused_close = true,
                Effect::SetFieldError { field, message } => match message {
                    Some(message) => {
                        self.field_errors.insert(field, message);
                    }
                    None => {
                        self.field_errors.remove(&field);
                    }
                },
                Effect::Alert { message } => self.alerts.push(message),
                Effect::SetSubmitBusy { busy, label } => {
                    self.submit_disabled = busy;
                    self.submit_label = label;
                }
                Effect::OpenExternal { url, features } => self.opened.push((url, features)),
                Effect::ScheduleReset { delay_ms } => {
                    self.timers.push(self.clock.now_ms() + delay_ms)
                }
                Effect::ResetForm => {
                    self.form = InquiryForm::default();
                    self.honeypot = HoneypotFields::default();
                }
                Effect::SetCsrfToken { token } => self.token_field = token,
                Effect::SetYear { year } => self.year = Some(year),
                Effect::PreventDefault => self.default_prevented = true,
                _ => {}
            }
        }
    }
}
