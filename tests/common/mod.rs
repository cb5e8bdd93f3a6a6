//! A scripted in-memory DOM session for driving the crawler in tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use weibo_scraper::browser::{BrowserError, DomElement, TimelinePage};
use weibo_scraper::selectors;

/// What an injected `find_all` failure should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    Timeout,
    Session,
}

type ClickFn = Arc<dyn Fn(&mut PageState) + Send + Sync>;

/// One scripted element: text, attributes, children per selector, and an
/// optional click action that mutates the page.
#[derive(Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub children: HashMap<String, Vec<FakeElement>>,
    pub on_click: Option<ClickFn>,
    /// When set, the first `text()` read keyed by this name times out.
    pub text_failure_key: Option<String>,
}

impl FakeElement {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, element: FakeElement) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    pub fn on_click(mut self, f: impl Fn(&mut PageState) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(f));
        self
    }

    /// Make the next `text()` read of this element fail with a render
    /// timeout, once.
    pub fn fail_text_once(mut self, key: &str) -> Self {
        self.text_failure_key = Some(key.to_string());
        self
    }
}

/// Build a plain timeline card: time element, one text div, whole-card
/// text used for fingerprinting.
pub fn card(time_str: &str, body: &str) -> FakeElement {
    FakeElement::with_text(&format!("{body}\n{time_str}"))
        .child(selectors::POST_TIME, FakeElement::with_text(time_str))
        .child(selectors::POST_TEXT, FakeElement::with_text(body))
}

/// The mutable scripted page.
#[derive(Default)]
pub struct PageState {
    pub url: String,
    /// Selector → currently "rendered" elements.
    pub view: HashMap<String, Vec<FakeElement>>,
    /// Card batches appended to the timeline by successive scrolls.
    pub pending_batches: VecDeque<Vec<FakeElement>>,
    /// Injected failures, keyed by 1-based index of post-card lookups.
    pub find_failures: HashMap<usize, FailKind>,
    pub card_find_calls: usize,
    /// One-shot text failures already consumed.
    pub spent_text_failures: HashSet<String>,
}

impl PageState {
    pub fn set_view(&mut self, selector: &str, elements: Vec<FakeElement>) {
        self.view.insert(selector.to_string(), elements);
    }
}

#[derive(Clone)]
pub struct FakePage {
    pub state: Arc<Mutex<PageState>>,
}

impl FakePage {
    /// A page whose timeline shows `initial` cards after navigation and
    /// reveals one batch from `batches` per scroll.
    pub fn new(initial: Vec<FakeElement>, batches: Vec<Vec<FakeElement>>) -> Self {
        let mut state = PageState::default();
        state.set_view(selectors::POST_CARD, initial);
        // The timeline marker is always part of the main view.
        state.set_view(
            selectors::TIMELINE_MARKER,
            vec![FakeElement::with_text("overlay")],
        );
        state.pending_batches = batches.into();
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn fail_card_lookup(&self, call: usize, kind: FailKind) {
        self.state
            .lock()
            .unwrap()
            .find_failures
            .insert(call, kind);
    }
}

fn injected(kind: FailKind) -> BrowserError {
    match kind {
        FailKind::Timeout => BrowserError::RenderTimeout {
            what: "injected".to_string(),
            timeout: std::time::Duration::from_millis(1),
        },
        FailKind::Session => BrowserError::Session("injected".to_string()),
    }
}

/// An element handle that can reach back into the page on click.
pub struct FakeHandle {
    element: FakeElement,
    state: Arc<Mutex<PageState>>,
}

fn wrap(elements: &[FakeElement], state: &Arc<Mutex<PageState>>) -> Vec<Box<dyn DomElement>> {
    elements
        .iter()
        .map(|e| {
            Box::new(FakeHandle {
                element: e.clone(),
                state: Arc::clone(state),
            }) as Box<dyn DomElement>
        })
        .collect()
}

#[async_trait]
impl DomElement for FakeHandle {
    async fn text(&self) -> Result<String, BrowserError> {
        if let Some(key) = &self.element.text_failure_key {
            let mut state = self.state.lock().unwrap();
            if state.spent_text_failures.insert(key.clone()) {
                return Err(injected(FailKind::Timeout));
            }
        }
        Ok(self.element.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.element.attrs.get(name).cloned())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, BrowserError> {
        let children = self.element.children.get(selector);
        Ok(children.map_or_else(Vec::new, |c| wrap(c, &self.state)))
    }

    async fn click(&self) -> Result<(), BrowserError> {
        if let Some(action) = &self.element.on_click {
            let mut state = self.state.lock().unwrap();
            action(&mut state);
        }
        Ok(())
    }
}

#[async_trait]
impl TimelinePage for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, BrowserError> {
        let mut state = self.state.lock().unwrap();
        if selector == selectors::POST_CARD {
            state.card_find_calls += 1;
            let call = state.card_find_calls;
            if let Some(kind) = state.find_failures.remove(&call) {
                return Err(injected(kind));
            }
        }
        let elements = state.view.get(selector).cloned().unwrap_or_default();
        Ok(wrap(&elements, &self.state))
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        if let Some(batch) = state.pending_batches.pop_front() {
            state
                .view
                .entry(selectors::POST_CARD.to_string())
                .or_default()
                .extend(batch);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().unwrap().url.clone())
    }
}
