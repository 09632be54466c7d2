//! Page controller.
//!
//! Hosts forward DOM activity as role-keyed [`Event`]s to a single
//! [`Storefront::dispatch`] and apply the returned [`Effect`]s. The controller
//! never touches the DOM itself, so one dispatcher replaces per-element
//! listeners and the whole page can be driven without a browser.

use chrono::{DateTime, Datelike};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::bot_detector::{BotDetector, HoneypotFields, Interaction};
use crate::catalog::{Catalog, Filter, ProductRecord, resolve_image};
use crate::clock::Clock;
use crate::config::SiteConfig;
use crate::csrf::{CsrfGuard, SessionStore};
use crate::inquiry::{InquiryForm, Rejection, screen_submission, whatsapp_url};
use crate::rate_limiter::RateLimiter;
use crate::sanitizer::{ImageSource, checked_image_source, escape_html, sanitize_input};
use crate::validator::{Field, validate_field};

pub const SUBMIT_LABEL: &str = "Send via WhatsApp";
pub const PROCESSING_LABEL: &str = "Processing...";
/// `window.open` features for the hand-off
pub const EXTERNAL_WINDOW_FEATURES: &str = "noopener,noreferrer";

const KEY_ENTER: &str = "Enter";
const KEY_SPACE: &str = " ";
const KEY_ESCAPE: &str = "Escape";

/// An `<img>` whose load failure the host reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSlot {
    Card { product_id: u32 },
    Modal,
}

/// Position of a `section[id]` at frame time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBox {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

/// DOM activity, keyed by the role of the element it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Document-level mouse move, key press, click or scroll
    Interaction { kind: Interaction },
    FilterSelected { filter: String },
    CardClicked { product_id: u32 },
    CardKeyDown { product_id: u32, key: String },
    ModalCloseClicked,
    /// Click inside the modal; `on_backdrop` is false for its content
    ModalClicked { on_backdrop: bool },
    /// Document-level key press
    KeyDown { key: String },
    MenuToggled,
    NavLinkClicked,
    AnchorClicked {
        href: String,
        target_top: Option<f64>,
        #[serde(default)]
        header_height: f64,
    },
    FieldBlurred { field: Field, value: String },
    FieldInput { field: Field },
    Submit {
        form: InquiryForm,
        #[serde(default)]
        honeypot: HoneypotFields,
    },
    ResetTimerFired,
    Scrolled,
    AnimationFrame {
        scroll_y: f64,
        #[serde(default)]
        sections: Vec<SectionBox>,
    },
    ImageFailed { slot: ImageSlot },
    ContextMenu { on_image: bool },
}

/// One product card, with every string already escaped for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub product_id: u32,
    /// Escaped id for the `data-id` attribute
    pub data_id: String,
    pub aria_label: String,
    pub image: ImageSource,
    pub title: String,
    pub category: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalView {
    pub product_id: u32,
    pub image: ImageSource,
    pub title: String,
    pub category: String,
    pub description: String,
}

/// DOM changes for the host to apply, in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Replace the grid contents with these cards
    RenderCards { cards: Vec<CardView> },
    SetActiveFilter { filter: String },
    /// Fill and show the modal, locking page scroll
    ShowModal { modal: ModalView },
    /// Hide the modal and unlock page scroll
    HideModal,
    FocusModalClose,
    SetFieldError { field: Field, message: Option<String> },
    Alert { message: String },
    SetSubmitBusy { busy: bool, label: String },
    OpenExternal { url: String, features: String },
    ScheduleReset { delay_ms: u64 },
    ResetForm,
    /// Write the token into the hidden form field
    SetCsrfToken { token: String },
    SetMenuOpen { open: bool },
    ScrollTo { top: f64 },
    RequestAnimationFrame,
    SetActiveNav { section_id: String },
    SetHeaderRaised { raised: bool },
    SetImageSource { slot: ImageSlot, src: String },
    SetYear { year: i32 },
    PreventDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open { product_id: u32 },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        matches!(self, ModalState::Open { .. })
    }
}

/// The page controller
pub struct Storefront<S: SessionStore, C: Clock> {
    config: SiteConfig,
    catalog: Catalog,
    limiter: RateLimiter,
    bot: BotDetector,
    csrf: CsrfGuard<S>,
    clock: C,
    modal: ModalState,
    menu_open: bool,
    frame_pending: bool,
    failed_images: HashSet<ImageSlot>,
}

impl<S: SessionStore, C: Clock> Storefront<S, C> {
    /// Page load happens "now" as far as the bot detector is concerned
    pub fn new(config: SiteConfig, catalog: Catalog, store: S, clock: C) -> Self {
        let loaded_at = clock.now_ms();
        Storefront {
            limiter: RateLimiter::new(&config),
            bot: BotDetector::new(&config, loaded_at),
            csrf: CsrfGuard::new(store),
            config,
            catalog,
            clock,
            modal: ModalState::Closed,
            menu_open: false,
            frame_pending: false,
            failed_images: HashSet::new(),
        }
    }

    /// Initial effects: token, footer year, full grid
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.rotate_token(&mut effects);

        let today = i64::try_from(self.clock.now_ms())
            .ok()
            .and_then(DateTime::from_timestamp_millis);
        if let Some(today) = today {
            effects.push(Effect::SetYear { year: today.year() });
        }

        effects.extend(self.render_products(&Filter::All));
        info!(
            "Storefront initialized with {} products",
            self.catalog.len()
        );
        effects
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        debug!("dispatch {:?}", event);
        match event {
            Event::Interaction { kind } => {
                self.bot.record(kind);
                Vec::new()
            }
            Event::FilterSelected { filter } => {
                let filter = Filter::parse(&filter);
                let mut effects = vec![Effect::SetActiveFilter {
                    filter: filter.as_str().to_string(),
                }];
                effects.extend(self.render_products(&filter));
                effects
            }
            Event::CardClicked { product_id } => self.open_modal(product_id),
            Event::CardKeyDown { product_id, key } => {
                if key == KEY_ENTER || key == KEY_SPACE {
                    let mut effects = vec![Effect::PreventDefault];
                    effects.extend(self.open_modal(product_id));
                    effects
                } else {
                    Vec::new()
                }
            }
            Event::ModalCloseClicked => self.close_modal(),
            Event::ModalClicked { on_backdrop } => {
                if on_backdrop {
                    self.close_modal()
                } else {
                    Vec::new()
                }
            }
            Event::KeyDown { key } => {
                if key == KEY_ESCAPE && self.modal.is_open() {
                    self.close_modal()
                } else {
                    Vec::new()
                }
            }
            Event::MenuToggled => {
                self.menu_open = !self.menu_open;
                vec![Effect::SetMenuOpen {
                    open: self.menu_open,
                }]
            }
            Event::NavLinkClicked => {
                self.menu_open = false;
                vec![Effect::SetMenuOpen { open: false }]
            }
            Event::AnchorClicked {
                href,
                target_top,
                header_height,
            } => {
                if !href.starts_with('#') || href == "#" {
                    return Vec::new();
                }
                let mut effects = vec![Effect::PreventDefault];
                if let Some(top) = target_top {
                    effects.push(Effect::ScrollTo {
                        top: top - header_height,
                    });
                }
                effects
            }
            Event::FieldBlurred { field, value } => vec![Effect::SetFieldError {
                field,
                message: validate_field(field, &value).message().map(String::from),
            }],
            Event::FieldInput { field } => vec![Effect::SetFieldError {
                field,
                message: None,
            }],
            Event::Submit { form, honeypot } => self.submit(&form, &honeypot),
            Event::ResetTimerFired => {
                let mut effects = vec![
                    Effect::ResetForm,
                    Effect::SetSubmitBusy {
                        busy: false,
                        label: SUBMIT_LABEL.to_string(),
                    },
                ];
                self.rotate_token(&mut effects);
                effects
            }
            Event::Scrolled => {
                if self.frame_pending {
                    return Vec::new();
                }
                self.frame_pending = true;
                vec![Effect::RequestAnimationFrame]
            }
            Event::AnimationFrame { scroll_y, sections } => {
                self.frame_pending = false;
                self.scroll_effects(scroll_y, &sections)
            }
            Event::ImageFailed { slot } => self.image_fallback(slot),
            Event::ContextMenu { on_image } => {
                if on_image {
                    vec![Effect::PreventDefault]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Rebuild the grid for `filter`; a no-op while rate limited
    pub fn render_products(&mut self, filter: &Filter) -> Vec<Effect> {
        if !self.limiter.check_limit(self.clock.now_ms()) {
            warn!("Rate limited");
            return Vec::new();
        }

        self.failed_images
            .retain(|slot| !matches!(slot, ImageSlot::Card { .. }));
        let cards = self
            .catalog
            .filtered(filter)
            .map(|product| self.card_view(product))
            .collect();
        vec![Effect::RenderCards { cards }]
    }

    pub fn modal(&self) -> ModalState {
        self.modal
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn csrf(&self) -> &CsrfGuard<S> {
        &self.csrf
    }

    fn open_modal(&mut self, product_id: u32) -> Vec<Effect> {
        let Some(product) = self.catalog.get(product_id) else {
            warn!("No product with id {}", product_id);
            return Vec::new();
        };
        let modal = self.modal_view(product);
        self.modal = ModalState::Open { product_id };
        self.failed_images.remove(&ImageSlot::Modal);
        vec![Effect::ShowModal { modal }, Effect::FocusModalClose]
    }

    fn close_modal(&mut self) -> Vec<Effect> {
        self.modal = ModalState::Closed;
        vec![Effect::HideModal]
    }

    fn submit(&mut self, form: &InquiryForm, honeypot: &HoneypotFields) -> Vec<Effect> {
        let now = self.clock.now_ms();
        let screened = screen_submission(
            form,
            honeypot,
            &self.bot,
            &mut self.limiter,
            &self.config,
            now,
        );

        let inquiry = match screened {
            Ok(inquiry) => inquiry,
            Err(Rejection::InvalidFields(report)) => {
                return report
                    .results()
                    .iter()
                    .map(|(field, validation)| Effect::SetFieldError {
                        field: *field,
                        message: validation.message().map(String::from),
                    })
                    .collect();
            }
            Err(rejection @ Rejection::MaliciousContent) => {
                let mut effects = clear_field_errors();
                effects.extend(rejection.alert_text().map(|message| Effect::Alert { message }));
                return effects;
            }
            Err(rejection) => {
                return rejection
                    .alert_text()
                    .map(|message| Effect::Alert { message })
                    .into_iter()
                    .collect();
            }
        };

        let url = whatsapp_url(&self.config, &inquiry.compose_message());
        info!("Inquiry handed off to WhatsApp");

        let mut effects = clear_field_errors();
        effects.extend([
            Effect::SetSubmitBusy {
                busy: true,
                label: PROCESSING_LABEL.to_string(),
            },
            Effect::OpenExternal {
                url,
                features: EXTERNAL_WINDOW_FEATURES.to_string(),
            },
            Effect::ScheduleReset {
                delay_ms: self.config.reset_delay_ms,
            },
        ]);
        effects
    }

    fn rotate_token(&mut self, effects: &mut Vec<Effect>) {
        match self.csrf.rotate() {
            Ok(token) => effects.push(Effect::SetCsrfToken { token }),
            Err(e) => warn!("Keeping previous token: {}", e),
        }
    }

    fn scroll_effects(&self, scroll_y: f64, sections: &[SectionBox]) -> Vec<Effect> {
        let probe = scroll_y + self.config.nav_scroll_offset;
        let mut effects: Vec<Effect> = sections
            .iter()
            .filter(|s| probe >= s.top && probe < s.top + s.height)
            .last()
            .map(|s| Effect::SetActiveNav {
                section_id: s.id.clone(),
            })
            .into_iter()
            .collect();
        effects.push(Effect::SetHeaderRaised {
            raised: scroll_y > self.config.header_shadow_threshold,
        });
        effects
    }

    /// Swap in a stand-in image, once per slot
    fn image_fallback(&mut self, slot: ImageSlot) -> Vec<Effect> {
        if !self.failed_images.insert(slot) {
            return Vec::new();
        }
        let src = match slot {
            ImageSlot::Card { product_id } => self
                .catalog
                .get(product_id)
                .map(|p| p.category.placeholder().to_string())
                .unwrap_or_else(|| self.config.generic_placeholder.clone()),
            ImageSlot::Modal => self.config.generic_placeholder.clone(),
        };
        vec![Effect::SetImageSource { slot, src }]
    }

    fn card_view(&self, product: &ProductRecord) -> CardView {
        CardView {
            product_id: product.id,
            data_id: escape_html(&product.id.to_string()),
            aria_label: format!("View {}", escape_html(&product.name)),
            image: checked_image_source(
                resolve_image(Some(product)),
                &product.alt,
                &self.config.page_host,
            ),
            title: sanitize_input(&product.name),
            category: sanitize_input(product.category.label()),
            price: sanitize_input(&product.price),
        }
    }

    fn modal_view(&self, product: &ProductRecord) -> ModalView {
        ModalView {
            product_id: product.id,
            image: checked_image_source(
                resolve_image(Some(product)),
                &product.name,
                &self.config.page_host,
            ),
            title: sanitize_input(&product.name),
            category: sanitize_input(product.category.label()),
            description: sanitize_input(&product.description),
        }
    }
}

fn clear_field_errors() -> Vec<Effect> {
    Field::ALL
        .into_iter()
        .map(|field| Effect::SetFieldError {
            field,
            message: None,
        })
        .collect()
}
