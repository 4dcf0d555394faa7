use super::*;

    pub(super) struct BrowserSurface {
        dialog_id: String,
        color_preview_id: String,
    }

    impl BrowserSurface {
        pub(super) fn new(dialog_id: &str, color_preview_id: &str) -> Self {
            Self {
                dialog_id: dialog_id.to_string(),
                color_preview_id: color_preview_id.to_string(),
            }
        }

        fn toggle_dialog(&self, visible: bool) {
            let action = if visible { "show" } else { "hide" };
            if call_modal(&self.dialog_id, &JsValue::from_str(action)).is_ok() {
                return;
            }
            let display = if visible { "block" } else { "none" };
            let styled = document().and_then(|document| {
                document
                    .get_element_by_id(&self.dialog_id)
                    .and_then(|element| element.dyn_into::<HtmlElement>().ok())
                    .ok_or_else(|| format!("#{} is missing", self.dialog_id))
            });
            match styled {
                Ok(dialog) => {
                    let _ = dialog.style().set_property("display", display);
                }
                Err(error) => tracing::warn!(%error, action, "entry dialog not toggled"),
            }
        }
    }

    #[async_trait(?Send)]
    impl PanelSurface for BrowserSurface {
        fn notify(&self, notice: Notice) {
            if let Err(error) = show_notification(&notice) {
                match notice.kind {
                    NoticeKind::Success => {
                        tracing::info!(text = %notice.text, %error, "notification shown in log only");
                    }
                    NoticeKind::Error => {
                        tracing::warn!(text = %notice.text, %error, "notification shown in log only");
                    }
                }
            }
        }

        async fn confirm(&self, prompt: &str) -> bool {
            web_sys::window()
                .and_then(|window| window.confirm_with_message(prompt).ok())
                .unwrap_or(false)
        }

        fn show_entry_dialog(&self) {
            self.toggle_dialog(true);
        }

        fn hide_entry_dialog(&self) {
            self.toggle_dialog(false);
        }

        fn refresh_color_preview(&self, color_hex: &str) {
            if let Err(error) = set_background_color(&self.color_preview_id, color_hex) {
                tracing::debug!(%error, "color preview not refreshed");
            }
        }
    }

    /// Bootstrap modal setup: hidden, backdrop click and Escape close it.
    pub(super) fn initialize_modal(dialog_id: &str) -> Result<(), String> {
        let options = js_sys::Object::new();
        set_property(&options, "show", &JsValue::FALSE)?;
        set_property(&options, "backdrop", &JsValue::TRUE)?;
        set_property(&options, "keyboard", &JsValue::TRUE)?;
        call_modal(dialog_id, &options)
    }

    fn call_modal(dialog_id: &str, argument: &JsValue) -> Result<(), String> {
        let jquery = global_function(JQUERY_GLOBAL)?;
        let selection = jquery
            .call1(&JsValue::NULL, &JsValue::from_str(&format!("#{dialog_id}")))
            .map_err(|_| format!("{JQUERY_GLOBAL}(#{dialog_id}) failed"))?;
        let modal = js_sys::Reflect::get(&selection, &JsValue::from_str("modal"))
            .ok()
            .and_then(|modal| modal.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| "bootstrap modal plugin is unavailable".to_string())?;
        modal
            .call1(&selection, argument)
            .map(drop)
            .map_err(|_| format!("modal call on #{dialog_id} failed"))
    }

    fn show_notification(notice: &Notice) -> Result<(), String> {
        let constructor = global_function(NOTIFY_GLOBAL)?;
        let kind = match notice.kind {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        };
        let options = js_sys::Object::new();
        set_property(&options, "title", &JsValue::from_str(notice.title))?;
        set_property(&options, "text", &JsValue::from_str(&notice.text))?;
        set_property(&options, "type", &JsValue::from_str(kind))?;
        js_sys::Reflect::construct(&constructor, &js_sys::Array::of1(&options))
            .map(drop)
            .map_err(|_| format!("{NOTIFY_GLOBAL} constructor failed"))
    }

    pub(super) fn global_function(name: &str) -> Result<js_sys::Function, String> {
        let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
        js_sys::Reflect::get(&window, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| format!("{name} is not available"))
    }

    pub(super) fn set_property(target: &JsValue, key: &str, value: &JsValue) -> Result<(), String> {
        js_sys::Reflect::set(target, &JsValue::from_str(key), value)
            .map(drop)
            .map_err(|_| format!("failed to set {key}"))
    }
