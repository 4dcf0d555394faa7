#[cfg(target_arch = "wasm32")]
mod wasm_constants;
#[cfg(target_arch = "wasm32")]
mod wasm_state;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::rc::Rc;
    use web_time::{Duration, Instant};

    use async_trait::async_trait;
    use futures_util::{FutureExt, pin_mut, select};
    use gloo_net::http::Request;
    use gloo_timers::future::sleep;
    use spooltracker_client_core::{
        CommandError, CommandRequest, CommandResponse, CommandTransport, DraftEdit, Notice,
        NoticeKind, OrderEnforcer, Panel, PanelConfig, PanelError, PanelSurface, PanelTree,
        PushOutcome, Snapshot, StartDirective, TickDirective, decode_response_body,
    };
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, Element, HtmlElement, MutationObserver};

    use crate::wasm_constants::*;
    use crate::wasm_state::PanelDiagnostics;

    mod dom;
    mod host;
    mod lifecycle;
    mod network;
    mod surface;

    pub use dom::DomPanelTree;
    use dom::*;
    use host::*;
    use lifecycle::*;
    use network::*;
    use surface::*;

    type WebPanel = Panel<HttpCommandTransport, BrowserSurface>;
    type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

    thread_local! {
        static PANEL: RefCell<Option<Rc<WebPanel>>> = const { RefCell::new(None) };
        static CONFIG: RefCell<PanelConfig> = RefCell::new(PanelConfig::default());
        static ENFORCER: RefCell<Option<OrderEnforcer>> = const { RefCell::new(None) };
        static DIAGNOSTICS: RefCell<PanelDiagnostics> = RefCell::new(PanelDiagnostics::default());
        static STARTUP_DONE: Cell<bool> = const { Cell::new(false) };
        static STATE_EVENT_PENDING: Cell<bool> = const { Cell::new(false) };
        static MUTATION_OBSERVER: RefCell<Option<(MutationObserver, MutationCallback)>> = const { RefCell::new(None) };
        static DOCUMENT_READY_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static HOST_CONSTRUCT: RefCell<Option<Closure<dyn FnMut(JsValue) -> JsValue>>> = const { RefCell::new(None) };
        static HOST_CALLBACKS: RefCell<Vec<Closure<dyn FnMut(JsValue, JsValue)>>> = const { RefCell::new(Vec::new()) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        let loaded = load_config();
        init_tracing(&loaded.config.log_level);
        if let Some(reason) = loaded.rejected.as_deref() {
            tracing::warn!(%reason, "ignoring host panel config, using defaults");
        }
        DIAGNOSTICS.with(|state| state.borrow_mut().config_source = loaded.source.to_string());
        set_boot_phase("booting", "starting spool tracker panel");

        let config = loaded.config;
        CONFIG.with(|slot| *slot.borrow_mut() = config.clone());

        start_order_enforcer(&config);
        if let Err(error) = inject_color_preview_style() {
            tracing::warn!(%error, "color preview style not injected");
        }
        install_panel(&config);

        match register_view_model() {
            Ok(()) => set_boot_phase("registered", "waiting for host startup"),
            Err(reason) => {
                tracing::info!(%reason, "view-model registry unavailable, starting immediately");
                on_startup();
            }
        }
    }

    #[wasm_bindgen]
    pub fn panel_diagnostics_json() -> String {
        record_order_stats();
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    #[wasm_bindgen]
    pub fn panel_state_json() -> String {
        current_panel()
            .and_then(|panel| panel.state_json().ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    /// Host `onStartup`: relocate the dialog, paint the preview, fetch the snapshot.
    #[wasm_bindgen]
    pub fn on_startup() {
        if STARTUP_DONE.with(|done| done.replace(true)) {
            return;
        }
        let dialog_id = CONFIG.with(|config| config.borrow().dialog_id.clone());
        if let Err(error) = relocate_dialog_to_body(&dialog_id) {
            tracing::warn!(%error, "entry dialog left in place");
        }
        if let Err(error) = initialize_modal(&dialog_id) {
            tracing::debug!(%error, "entry dialog modal not initialized");
        }

        let Some(panel) = current_panel() else {
            set_boot_error("panel is not installed");
            return;
        };
        let color_hex = panel.with_state(|state| state.draft.fields.color_hex.clone());
        panel.surface().refresh_color_preview(&color_hex);

        set_boot_phase("loading", "fetching spool snapshot");
        spawn_local(async move {
            match panel.load_snapshot().await {
                Ok(()) => {
                    DIAGNOSTICS.with(|state| state.borrow_mut().snapshot_loaded = true);
                    set_boot_phase("ready", "spool snapshot loaded");
                }
                Err(error) => set_boot_error(&format!("snapshot fetch failed: {error}")),
            }
            schedule_state_event();
        });
    }

    /// Host `onDataUpdaterPluginMessage`.
    #[wasm_bindgen]
    pub fn on_plugin_message(plugin: String, data: JsValue) {
        let Some(panel) = current_panel() else {
            return;
        };
        let body = js_to_json(&data);
        let outcome = panel.handle_push(&plugin, &body);
        record_push(&outcome);
    }

    #[wasm_bindgen]
    pub fn save_profile() {
        run_command("save_profile", |panel| async move {
            panel.profiles().save_profile().await
        });
    }

    #[wasm_bindgen]
    pub fn delete_profile() {
        run_command("delete_profile", |panel| async move {
            panel.profiles().delete_profile().await.map(drop)
        });
    }

    #[wasm_bindgen]
    pub fn submit_new_spool() {
        run_command("load_new_spool", |panel| async move {
            panel.form().submit_new_spool().await
        });
    }

    #[wasm_bindgen]
    pub fn reset_form() {
        if let Some(panel) = current_panel() {
            panel.form().reset_form();
            schedule_state_event();
        }
    }

    #[wasm_bindgen]
    pub fn show_new_spool_dialog() {
        if let Some(panel) = current_panel() {
            panel.form().open_entry_dialog();
        }
    }

    /// Applies one bound-control edit. Returns `false` for unknown fields or a
    /// failed profile load.
    #[wasm_bindgen]
    pub fn edit_draft(field: String, value: String) -> bool {
        let Some(edit) = DraftEdit::from_field(&field, value) else {
            tracing::warn!(%field, "unknown draft field");
            return false;
        };
        let Some(panel) = current_panel() else {
            return false;
        };
        let result = panel.form().edit(edit);
        schedule_state_event();
        result.is_ok()
    }

    fn install_panel(config: &PanelConfig) {
        let transport =
            HttpCommandTransport::new(config.command_endpoint(), config.request_timeout_ms());
        let surface = BrowserSurface::new(&config.dialog_id, &config.color_preview_id);
        let panel = Rc::new(Panel::new(config.plugin_id.clone(), transport, surface));
        panel.subscribe(|event, store| {
            tracing::trace!(?event, revision = store.revision(), "spool state changed");
            DIAGNOSTICS.with(|state| state.borrow_mut().store_revision = store.revision());
            schedule_state_event();
        });
        PANEL.with(|slot| *slot.borrow_mut() = Some(panel));
    }

    fn current_panel() -> Option<Rc<WebPanel>> {
        PANEL.with(|slot| slot.borrow().clone())
    }

    fn run_command<F, Fut>(command: &'static str, operation: F)
    where
        F: FnOnce(Rc<WebPanel>) -> Fut + 'static,
        Fut: Future<Output = Result<(), PanelError>> + 'static,
    {
        let Some(panel) = current_panel() else {
            tracing::warn!(command, "panel is not installed");
            return;
        };
        spawn_local(async move {
            let started = Instant::now();
            let result = operation(panel).await;
            record_command(command, started.elapsed(), result.as_ref().err());
            schedule_state_event();
        });
    }

    fn start_order_enforcer(config: &PanelConfig) {
        let tree = match DomPanelTree::from_window() {
            Ok(tree) => tree,
            Err(error) => {
                tracing::warn!(%error, "sidebar ordering disabled");
                return;
            }
        };
        let mut enforcer = OrderEnforcer::from_config(config);
        let directive = enforcer.start(&tree);
        ENFORCER.with(|slot| *slot.borrow_mut() = Some(enforcer));

        if let StartDirective::StartRetryTimer { period_ms } = directive {
            spawn_retry_timer(period_ms);
        }
        watch_after_document_load();
        record_order_stats();
    }

    fn spawn_retry_timer(period_ms: u32) {
        spawn_local(async move {
            loop {
                sleep(Duration::from_millis(u64::from(period_ms))).await;
                match with_enforcer(|enforcer, tree| enforcer.on_retry_tick(tree)) {
                    Some(TickDirective::Continue) => {}
                    Some(TickDirective::Cancel) | None => break,
                }
            }
            record_order_stats();
        });
    }

    fn js_to_json(value: &JsValue) -> serde_json::Value {
        js_sys::JSON::stringify(value)
            .ok()
            .and_then(|raw| raw.as_string())
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomPanelTree, panel_diagnostics_json};

#[cfg(not(target_arch = "wasm32"))]
pub fn panel_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"panel diagnostics only available on wasm\"}".to_string()
}
