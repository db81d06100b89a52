#![forbid(unsafe_code)]

//! `wasm-bindgen` exports and the browser [`FlipHost`].
//!
//! Only compiled on `wasm32` targets.

use core::fmt;
use std::cell::RefCell;
use std::io;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use js_sys::{Promise, Reflect};
use pageflip_core::preview::{PreviewRequest, install_preview};
use pageflip_core::{
    BootMode, FlipController, FlipDirection, FlipError, FlipHost, FlipSignal, PageLocation,
    PreparedFlip, StyleProperty,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, Element, Event, HtmlElement, Response, ShadowRootInit, ShadowRootMode,
    TransitionEvent, Window,
};

use crate::boot::{self, BootDecision, StartPlan};

#[wasm_bindgen]
extern "C" {
    /// `<portal>` element: an embedded, activatable browsing context.
    #[wasm_bindgen(
        extends = HtmlElement,
        extends = Element,
        extends = web_sys::Node,
        extends = web_sys::EventTarget,
        extends = js_sys::Object,
        js_name = HTMLPortalElement,
        typescript_type = "HTMLPortalElement"
    )]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub type HtmlPortalElement;

    #[wasm_bindgen(method, getter)]
    fn src(this: &HtmlPortalElement) -> String;

    #[wasm_bindgen(method, setter)]
    fn set_src(this: &HtmlPortalElement, value: &str);

    #[wasm_bindgen(method, catch)]
    fn activate(this: &HtmlPortalElement) -> Result<Promise, JsValue>;

    #[wasm_bindgen(
        extends = Event,
        extends = js_sys::Object,
        js_name = PortalActivateEvent,
        typescript_type = "PortalActivateEvent"
    )]
    #[derive(Debug, Clone)]
    type PortalActivateEvent;

    #[wasm_bindgen(method, catch, js_name = adoptPredecessor)]
    fn adopt_predecessor(this: &PortalActivateEvent) -> Result<HtmlPortalElement, JsValue>;
}

// ---------------------------------------------------------------------------
// Console plumbing
// ---------------------------------------------------------------------------

fn console_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

/// Buffers one formatted event and writes it to the console on drop.
struct ConsoleWriter {
    level: tracing::Level,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        let line = JsValue::from_str(line.trim_end());
        match self.level {
            tracing::Level::ERROR => web_sys::console::error_1(&line),
            tracing::Level::WARN => web_sys::console::warn_1(&line),
            tracing::Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: tracing::Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}

/// Route `tracing` output to the browser console.
///
/// `level` is a `tracing` level name (`"debug"`, `"warn"`, ...); absent or
/// unknown means `info`. Only the first call installs a subscriber.
#[wasm_bindgen(js_name = installConsoleLogging)]
pub fn install_console_logging(level: Option<String>) -> bool {
    let level = level
        .as_deref()
        .and_then(|name| tracing::Level::from_str(name).ok())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .try_init()
        .is_ok()
}

// ---------------------------------------------------------------------------
// Browser host
// ---------------------------------------------------------------------------

type SignalSink = Rc<dyn Fn(FlipSignal)>;
type ControllerCell = Rc<RefCell<Option<FlipController<WebHost>>>>;

fn host_err(context: &str, err: &JsValue) -> FlipError {
    FlipError::Host(format!("{context}: {err:?}"))
}

fn to_js(err: &FlipError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// [`FlipHost`] over the live document.
///
/// Cheap to clone: every field is a JS reference or an `Rc`.
#[derive(Clone)]
pub struct WebHost {
    window: Window,
    document: Document,
    sink: SignalSink,
}

impl fmt::Debug for WebHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebHost").finish_non_exhaustive()
    }
}

impl WebHost {
    fn new(window: Window, document: Document, sink: SignalSink) -> Self {
        Self {
            window,
            document,
            sink,
        }
    }

    fn body(&self) -> pageflip_core::Result<HtmlElement> {
        self.document
            .body()
            .ok_or_else(|| FlipError::Host("document has no body".into()))
    }

    fn forward(
        &self,
        target: &web_sys::EventTarget,
        event_type: &str,
        make: fn(&Event) -> FlipSignal,
    ) -> pageflip_core::Result<()> {
        let sink = Rc::clone(&self.sink);
        let callback = Closure::wrap(Box::new(move |event: Event| {
            sink(make(&event));
        }) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(event_type, callback.as_ref().unchecked_ref())
            .map_err(|err| host_err(event_type, &err))?;
        // Listeners live as long as the document.
        callback.forget();
        Ok(())
    }
}

async fn fetch_text(window: &Window, src: &str) -> Result<String, JsValue> {
    let response: Response = JsFuture::from(window.fetch_with_str(src))
        .await?
        .dyn_into()?;
    let text = JsFuture::from(response.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

fn click_next(_: &Event) -> FlipSignal {
    FlipSignal::Click(FlipDirection::Next)
}

fn click_prev(_: &Event) -> FlipSignal {
    FlipSignal::Click(FlipDirection::Prev)
}

fn transition_end(event: &Event) -> FlipSignal {
    let property = event
        .dyn_ref::<TransitionEvent>()
        .map(TransitionEvent::property_name)
        .unwrap_or_default();
    FlipSignal::transition_end(property)
}

impl FlipHost for WebHost {
    type Element = Element;
    type Portal = HtmlPortalElement;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn append_markup(&mut self, markup: &str) -> pageflip_core::Result<()> {
        let wrapper = self
            .document
            .create_element("div")
            .map_err(|err| host_err("create scaffold", &err))?;
        wrapper.set_inner_html(markup);
        self.body()?
            .append_child(&wrapper)
            .map_err(|err| host_err("append scaffold", &err))?;
        Ok(())
    }

    fn create_portal(&mut self, src: &str) -> pageflip_core::Result<HtmlPortalElement> {
        let portal: HtmlPortalElement = self
            .document
            .create_element("portal")
            .map_err(|err| host_err("create portal", &err))?
            .unchecked_into();
        portal.set_src(src);
        Ok(portal)
    }

    fn duplicate_portal(
        &mut self,
        portal: &HtmlPortalElement,
    ) -> pageflip_core::Result<HtmlPortalElement> {
        let copy = portal
            .clone_node()
            .map_err(|err| host_err("clone portal", &err))?;
        Ok(copy.unchecked_into())
    }

    fn portal_src(&self, portal: &HtmlPortalElement) -> String {
        portal.src()
    }

    fn append_portal(
        &mut self,
        container: &Element,
        portal: &HtmlPortalElement,
    ) -> pageflip_core::Result<()> {
        container
            .append_child(portal)
            .map_err(|err| host_err("append portal", &err))?;
        Ok(())
    }

    fn attach_isolated(&mut self, container: &Element, markup: &str) -> pageflip_core::Result<()> {
        let holder = self
            .document
            .create_element("div")
            .map_err(|err| host_err("create preview holder", &err))?;
        let root = holder
            .attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))
            .map_err(|err| host_err("attach shadow root", &err))?;
        root.set_inner_html(markup);
        container
            .append_child(&holder)
            .map_err(|err| host_err("append preview", &err))?;
        Ok(())
    }

    fn set_style(
        &mut self,
        element: &Element,
        property: StyleProperty,
        value: &str,
    ) -> pageflip_core::Result<()> {
        let Some(element) = element.dyn_ref::<HtmlElement>() else {
            return Err(FlipError::Host(format!(
                "<{}> has no inline style",
                element.tag_name()
            )));
        };
        element
            .style()
            .set_property(property.css_name(), value)
            .map_err(|err| host_err(property.css_name(), &err))
    }

    fn listen_click(
        &mut self,
        direction: FlipDirection,
        element: &Element,
    ) -> pageflip_core::Result<()> {
        let make: fn(&Event) -> FlipSignal = match direction {
            FlipDirection::Next => click_next,
            FlipDirection::Prev => click_prev,
        };
        self.forward(element, "click", make)
    }

    fn listen_transition_end(&mut self) -> pageflip_core::Result<()> {
        self.forward(&self.document, "transitionend", transition_end)
    }

    fn fetch_preview(&mut self, request: PreviewRequest<Element>) {
        let mut host = self.clone();
        spawn_local(async move {
            match fetch_text(&host.window, &request.src).await {
                Ok(markup) => {
                    // install_preview reports its own failures.
                    let _ = install_preview(&mut host, &request, &markup);
                }
                Err(err) => debug!(
                    target: "pageflip.preview",
                    src = %request.src,
                    error = ?err,
                    "preview fetch failed"
                ),
            }
        });
    }

    fn activate(&mut self, portal: &HtmlPortalElement) {
        let portal = portal.clone();
        spawn_local(async move {
            let activated = match portal.activate() {
                Ok(promise) => JsFuture::from(promise).await.map(drop),
                Err(err) => Err(err),
            };
            if let Err(err) = activated {
                warn!(
                    target: "pageflip.web",
                    src = %portal.src(),
                    error = ?err,
                    "portal activation rejected"
                );
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn has_global(window: &Window, name: &str) -> bool {
    Reflect::get(window, &JsValue::from_str(name))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false)
}

fn current_location(window: &Window) -> pageflip_core::Result<PageLocation> {
    let location = window.location();
    let origin = location.origin().map_err(|err| host_err("origin", &err))?;
    let pathname = location
        .pathname()
        .map_err(|err| host_err("pathname", &err))?;
    let search = location.search().map_err(|err| host_err("search", &err))?;
    Ok(PageLocation::new(origin, pathname, search))
}

/// Without portal support the folds would hide the page; show it as is.
fn reveal_page(document: &Document) {
    let roots = [
        document.body().map(Element::from),
        document.document_element(),
    ];
    for root in roots.into_iter().flatten() {
        if let Some(root) = root.dyn_ref::<HtmlElement>() {
            let _ = root.style().set_property("overflow", "visible");
        }
    }
}

fn signal_sink(cell: Weak<RefCell<Option<FlipController<WebHost>>>>) -> SignalSink {
    Rc::new(move |signal: FlipSignal| {
        let Some(cell) = cell.upgrade() else {
            return;
        };
        let Ok(mut slot) = cell.try_borrow_mut() else {
            warn!(
                target: "pageflip.web",
                kind = ?signal.kind(),
                "signal dropped: controller busy"
            );
            return;
        };
        if let Some(controller) = slot.as_mut() {
            controller.dispatch(signal);
        }
    })
}

/// Layout and preview for the current document, before any boot mode is known.
fn prepare(
    cell: &ControllerCell,
    window: Window,
    document: Document,
    plan: StartPlan,
) -> pageflip_core::Result<PreparedFlip<WebHost>> {
    let location = current_location(&window)?;
    let host = WebHost::new(window, document, signal_sink(Rc::downgrade(cell)));
    PreparedFlip::prepare(host, plan.config, plan.adjacency.as_ref(), &location)
}

fn arm(
    cell: &ControllerCell,
    prepared: PreparedFlip<WebHost>,
    boot: BootMode<HtmlPortalElement>,
) -> pageflip_core::Result<()> {
    let controller = prepared.arm(boot)?;
    *cell.borrow_mut() = Some(controller);
    Ok(())
}

/// Page-flip navigation for the current document.
///
/// ```js
/// const flip = new PageFlip();
/// flip.start(JSON.stringify({ "/a.html": { next: "/b.html" } }));
/// ```
#[wasm_bindgen]
pub struct PageFlip {
    controller: ControllerCell,
    decision: Option<BootDecision>,
}

impl Default for PageFlip {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PageFlip {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        install_panic_hook();
        Self {
            controller: Rc::new(RefCell::new(None)),
            decision: None,
        }
    }

    /// Parse the inputs and boot for the current document.
    ///
    /// Returns the boot decision label. Layout and preview are set up right
    /// away; inside a portal host the controller is armed later, when the
    /// document is activated.
    pub fn start(
        &mut self,
        adjacency_json: &str,
        config_json: Option<String>,
    ) -> Result<String, JsValue> {
        if self.decision.is_some() {
            return Err(JsValue::from_str("PageFlip already started"));
        }
        let plan =
            StartPlan::parse(adjacency_json, config_json.as_deref()).map_err(|e| to_js(&e))?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let decision = BootDecision::decide(
            has_global(&window, "HTMLPortalElement"),
            has_global(&window, "portalHost"),
        );
        info!(target: "pageflip.web", decision = decision.label(), "boot");
        self.decision = Some(decision);

        match decision {
            BootDecision::PlainPage => reveal_page(&document),
            BootDecision::BuildNow => {
                let prepared =
                    prepare(&self.controller, window, document, plan).map_err(|e| to_js(&e))?;
                arm(&self.controller, prepared, BootMode::Initial).map_err(|e| to_js(&e))?;
            }
            BootDecision::AwaitActivation => {
                let target = window.clone();
                let prepared =
                    prepare(&self.controller, window, document, plan).map_err(|e| to_js(&e))?;
                let cell = Rc::clone(&self.controller);
                let on_activate = Closure::once(move |event: Event| {
                    let predecessor = event
                        .dyn_ref::<PortalActivateEvent>()
                        .and_then(|event| event.adopt_predecessor().ok());
                    debug!(
                        target: "pageflip.web",
                        adopted = predecessor.is_some(),
                        "portal activated"
                    );
                    if let Err(err) = arm(&cell, prepared, BootMode::Activated { predecessor }) {
                        error!(target: "pageflip.web", error = %err, "controller arm failed");
                    }
                });
                target
                    .add_event_listener_with_callback(
                        "portalactivate",
                        on_activate.as_ref().unchecked_ref(),
                    )
                    .map_err(|err| to_js(&host_err("portalactivate", &err)))?;
                on_activate.forget();
            }
        }
        Ok(decision.label().to_owned())
    }

    /// Whether a controller is running.
    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.controller.borrow().is_some()
    }

    /// Lifecycle phase label, `"unbooted"` before a controller exists.
    pub fn phase(&self) -> String {
        self.controller
            .borrow()
            .as_ref()
            .map_or("unbooted", |controller| controller.phase().label())
            .to_owned()
    }

    #[wasm_bindgen(js_name = isTransitioning)]
    pub fn is_transitioning(&self) -> bool {
        self.controller
            .borrow()
            .as_ref()
            .is_some_and(FlipController::is_transitioning)
    }

    #[wasm_bindgen(js_name = currentPage)]
    pub fn current_page(&self) -> Option<String> {
        self.controller
            .borrow()
            .as_ref()
            .map(|controller| controller.current_page().to_string())
    }

    /// JSON snapshot of the controller, `null` before boot.
    #[wasm_bindgen(js_name = stateJson)]
    pub fn state_json(&self) -> Option<String> {
        self.controller
            .borrow()
            .as_ref()
            .map(|controller| boot::state_json(&controller.state(), controller.phase()))
    }

    /// Take buffered dispatch records as JSONL.
    #[wasm_bindgen(js_name = drainLogsJsonl)]
    pub fn drain_logs_jsonl(&self) -> String {
        self.controller
            .borrow_mut()
            .as_mut()
            .map(|controller| boot::logs_jsonl(&controller.drain_logs()))
            .unwrap_or_default()
    }
}
