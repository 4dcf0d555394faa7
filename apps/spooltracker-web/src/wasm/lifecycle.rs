use super::*;

    use std::io;

    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::MakeWriter;

    pub(super) struct LoadedConfig {
        pub(super) config: PanelConfig,
        pub(super) source: &'static str,
        pub(super) rejected: Option<String>,
    }

    /// Reads `window.SPOOLTRACKER_CONFIG`; a missing or invalid value yields defaults.
    pub(super) fn load_config() -> LoadedConfig {
        let defaults = |rejected: Option<String>| LoadedConfig {
            config: PanelConfig::default(),
            source: "default",
            rejected,
        };
        let Some(window) = web_sys::window() else {
            return defaults(None);
        };
        let raw = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null());
        let Some(raw) = raw else {
            return defaults(None);
        };
        let Some(json) = js_sys::JSON::stringify(&raw)
            .ok()
            .and_then(|json| json.as_string())
        else {
            return defaults(Some(format!("{CONFIG_GLOBAL} is not serializable")));
        };

        match PanelConfig::from_json(&json) {
            Ok(config) => LoadedConfig {
                config,
                source: "window",
                rejected: None,
            },
            Err(error) => defaults(Some(error.to_string())),
        }
    }

    pub(super) fn init_tracing(log_level: &str) {
        let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(ConsoleMakeWriter)
            .with_ansi(false)
            .without_time()
            .try_init();
    }

    /// Routes formatted tracing lines to the matching `console` method.
    struct ConsoleMakeWriter;

    struct ConsoleWriter {
        level: tracing::Level,
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buffer);
            let line = line.trim_end();
            if line.is_empty() {
                return;
            }
            let line = JsValue::from_str(line);
            match self.level {
                tracing::Level::ERROR => web_sys::console::error_1(&line),
                tracing::Level::WARN => web_sys::console::warn_1(&line),
                tracing::Level::INFO => web_sys::console::info_1(&line),
                _ => web_sys::console::debug_1(&line),
            }
        }
    }

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: tracing::Level::INFO,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buffer: Vec::new(),
            }
        }
    }

    pub(super) fn set_boot_phase(phase: &str, detail: &str) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = phase.to_string();
            state.detail = detail.to_string();
        });
        tracing::info!(phase, detail, "panel lifecycle");
    }

    pub(super) fn set_boot_error(message: &str) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = "error".to_string();
            state.detail = "startup incomplete".to_string();
            state.last_error = Some(message.to_string());
        });
        tracing::error!(error = message, "panel startup incomplete");
    }

    pub(super) fn record_order_stats() {
        let stats = with_enforcer(|enforcer, _| enforcer.stats());
        DIAGNOSTICS.with(|state| state.borrow_mut().order = stats);
    }

    pub(super) fn record_push(outcome: &PushOutcome) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            match outcome {
                PushOutcome::Ignored => {}
                PushOutcome::Applied { rejected, .. } => {
                    state.push_messages = state.push_messages.saturating_add(1);
                    if !rejected.is_empty() {
                        state.push_malformed = state.push_malformed.saturating_add(1);
                        state.last_error =
                            Some(format!("mistyped push fields: {}", rejected.join(", ")));
                    }
                }
                PushOutcome::Malformed { reason } => {
                    state.push_malformed = state.push_malformed.saturating_add(1);
                    state.last_error = Some(reason.clone());
                }
            }
        });
    }

    pub(super) fn record_command(command: &str, elapsed: Duration, error: Option<&PanelError>) {
        let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match error {
            Some(error) => tracing::warn!(command, latency_ms, %error, "panel command failed"),
            None => tracing::debug!(command, latency_ms, "panel command completed"),
        }
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.command_total = state.command_total.saturating_add(1);
            state.last_command = Some(command.to_string());
            state.last_command_latency_ms = Some(latency_ms);
            if let Some(error) = error {
                state.command_failures = state.command_failures.saturating_add(1);
                state.last_error = Some(error.to_string());
            }
        });
    }

    /// Coalesces store changes into one `spooltracker:state` event per turn.
    pub(super) fn schedule_state_event() {
        if STATE_EVENT_PENDING.with(|pending| pending.replace(true)) {
            return;
        }
        spawn_local(async {
            STATE_EVENT_PENDING.with(|pending| pending.set(false));
            if let Err(error) = dispatch_state_event() {
                tracing::debug!(%error, "state event not dispatched");
            }
        });
    }

    fn dispatch_state_event() -> Result<(), String> {
        let Some(panel) = current_panel() else {
            return Ok(());
        };
        let json = panel
            .state_json()
            .map_err(|error| format!("failed to serialize panel state: {error}"))?;
        let detail = js_sys::JSON::parse(&json).map_err(|_| "failed to parse panel state".to_string())?;
        let init = web_sys::CustomEventInit::new();
        init.set_detail(&detail);
        let event = web_sys::CustomEvent::new_with_event_init_dict(STATE_EVENT_NAME, &init)
            .map_err(|_| "failed to create state event".to_string())?;
        web_sys::window()
            .ok_or_else(|| "window is unavailable".to_string())?
            .dispatch_event(&event)
            .map(drop)
            .map_err(|_| "failed to dispatch state event".to_string())
    }
