//! Single-active-screen navigation.

use tracing::{debug, warn};

use crate::document::{Document, WidgetId};
use crate::events::OutboundEvent;
use crate::registry::Widget;

/// Screen whose entry also asks the host for a track listing.
pub const LIBRARY_SCREEN: &str = "library";
pub const DEFAULT_HEADER_TITLE: &str = "RPi Car Infotainment";

const ACTIVE_CLASS: &str = "active";
const SCREEN_CLASS: &str = "screen";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub id: String,
    pub title: String,
}

impl Screen {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

pub fn section_id(screen: &str) -> String {
    format!("screen-{screen}")
}

pub fn nav_button_id(screen: &str) -> String {
    format!("nav-{screen}")
}

/// Where a navigation request came from. Only user requests are reported
/// back to the host; host requests are the host's own decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOrigin {
    User,
    Host,
}

#[derive(Debug, Default)]
pub struct Navigator {
    screens: Vec<Screen>,
    active: Option<String>,
}

impl Navigator {
    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn screen(&self, id: &str) -> Option<&Screen> {
        self.screens.iter().find(|screen| screen.id == id)
    }

    /// Screens declared in markup as `section.screen[data-title]` with an id
    /// of the form `screen-<id>`.
    pub fn discover(doc: &Document) -> Vec<Screen> {
        doc.elements_with_attr("data-title")
            .into_iter()
            .filter(|section| doc.has_class(*section, SCREEN_CLASS))
            .filter_map(|section| {
                let id = doc.attr(section, "id")?.strip_prefix("screen-")?;
                let title = doc.attr(section, "data-title").unwrap_or(id);
                Some(Screen::new(id, title))
            })
            .collect()
    }

    /// Replace the known screens wholesale and rebuild the nav bar.
    ///
    /// Activates `requested` when it names one of the new screens, otherwise
    /// the first screen, otherwise nothing. Returns the events owed to the
    /// host for the screen it lands on.
    pub fn replace_screens(
        &mut self,
        screens: Vec<Screen>,
        requested: Option<&str>,
        doc: &mut Document,
    ) -> Vec<OutboundEvent> {
        let mut unique: Vec<Screen> = Vec::with_capacity(screens.len());
        for screen in screens {
            if unique.iter().any(|known| known.id == screen.id) {
                warn!(screen = %screen.id, "duplicate screen id ignored");
                continue;
            }
            unique.push(screen);
        }

        self.screens = unique;
        self.active = None;
        self.rebuild_nav(doc);

        for screen in &self.screens {
            ensure_section(doc, screen);
        }

        let target = requested
            .filter(|id| self.screen(id).is_some())
            .map(str::to_string)
            .or_else(|| self.screens.first().map(|screen| screen.id.clone()));

        let Some(id) = target else {
            clear_activation(doc);
            return Vec::new();
        };

        self.activate(&id, doc);
        entry_events(&id)
    }

    /// Transition to `id`. Returns the events owed to the host, in order.
    ///
    /// Unknown ids leave both the state and the tree untouched.
    pub fn request(
        &mut self,
        id: &str,
        origin: NavigationOrigin,
        doc: &mut Document,
    ) -> Vec<OutboundEvent> {
        if self.screen(id).is_none() {
            warn!(screen = id, ?origin, "navigation to unknown screen ignored");
            return Vec::new();
        }

        self.activate(id, doc);

        let mut owed = Vec::new();
        if origin == NavigationOrigin::User {
            owed.push(OutboundEvent::Navigate {
                screen: id.to_string(),
            });
        }
        owed.extend(entry_events(id));
        owed
    }

    fn activate(&mut self, id: &str, doc: &mut Document) {
        debug!(screen = id, previous = ?self.active, "activating screen");
        self.active = Some(id.to_string());

        for button in doc.elements_with_attr("data-navigate") {
            if is_nav_button(doc, button) {
                let on = doc.attr(button, "data-navigate") == Some(id);
                doc.toggle_class(button, ACTIVE_CLASS, on);
            }
        }

        let target = section_id(id);
        for section in screen_sections(doc) {
            let on = doc.attr(section, "id") == Some(target.as_str());
            doc.toggle_class(section, ACTIVE_CLASS, on);
        }

        if let Some(header) = doc.element_by_id(&Widget::HeaderTitle.element_id()) {
            let title = self
                .screen(id)
                .map(|screen| screen.title.clone())
                .unwrap_or_else(|| DEFAULT_HEADER_TITLE.to_string());
            doc.set_text(header, &title);
        }
    }

    fn rebuild_nav(&self, doc: &mut Document) {
        let Some(nav) = doc.element_by_id(&Widget::Nav.element_id()) else {
            debug!("no nav container; skipping nav buttons");
            return;
        };

        doc.clear_children(nav);
        for screen in &self.screens {
            let button_id = nav_button_id(&screen.id);
            doc.append_element(
                nav,
                "button",
                &[
                    ("id", button_id.as_str()),
                    ("class", "nav-button"),
                    ("data-navigate", screen.id.as_str()),
                ],
                &screen.title,
            );
        }
    }
}

/// Events owed on entering `id`, whoever asked for it.
fn entry_events(id: &str) -> Vec<OutboundEvent> {
    if id == LIBRARY_SCREEN {
        vec![OutboundEvent::LibraryRequest]
    } else {
        Vec::new()
    }
}

fn is_nav_button(doc: &Document, button: WidgetId) -> bool {
    doc.has_class(button, "nav-button")
}

fn screen_sections(doc: &Document) -> Vec<WidgetId> {
    doc.walk(doc.root())
        .into_iter()
        .filter(|node| doc.has_class(*node, SCREEN_CLASS))
        .collect()
}

fn clear_activation(doc: &mut Document) {
    for section in screen_sections(doc) {
        doc.toggle_class(section, ACTIVE_CLASS, false);
    }
    if let Some(header) = doc.element_by_id(&Widget::HeaderTitle.element_id()) {
        doc.set_text(header, DEFAULT_HEADER_TITLE);
    }
}

fn ensure_section(doc: &mut Document, screen: &Screen) {
    let id = section_id(&screen.id);
    if doc.element_by_id(&id).is_some() {
        return;
    }

    let Some(main) = doc.element_by_id(&Widget::Main.element_id()) else {
        return;
    };

    let Some(section) =
        doc.append_element(main, "section", &[("id", id.as_str()), ("class", SCREEN_CLASS)], "")
    else {
        return;
    };

    doc.append_element(section, "h2", &[], &screen.title);
    doc.append_element(
        section,
        "p",
        &[],
        &format!(
            "Content for {} is not yet customised for the HTML UI.",
            screen.title
        ),
    );
}
