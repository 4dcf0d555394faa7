use super::*;

    /// Pushes `{construct, dependencies, elements}` onto the host's view-model
    /// registry. Errors when the registry global is absent.
    pub(super) fn register_view_model() -> Result<(), String> {
        let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
        let registry = js_sys::Reflect::get(&window, &JsValue::from_str(VIEW_MODEL_REGISTRY_GLOBAL))
            .ok()
            .filter(js_sys::Array::is_array)
            .map(js_sys::Array::from)
            .ok_or_else(|| format!("{VIEW_MODEL_REGISTRY_GLOBAL} is not an array"))?;

        let construct = Closure::<dyn FnMut(JsValue) -> JsValue>::wrap(Box::new(|_parameters| {
            match build_view_model() {
                Ok(view_model) => view_model.into(),
                Err(error) => {
                    tracing::error!(%error, "view model construction failed");
                    JsValue::UNDEFINED
                }
            }
        }));

        let entry = js_sys::Object::new();
        set_property(&entry, "construct", construct.as_ref())?;
        set_property(&entry, "dependencies", &js_sys::Array::new())?;
        set_property(
            &entry,
            "elements",
            &js_sys::Array::of1(&JsValue::from_str(VIEW_MODEL_ELEMENT)),
        )?;
        registry.push(&entry);

        HOST_CONSTRUCT.with(|slot| *slot.borrow_mut() = Some(construct));
        DIAGNOSTICS.with(|state| state.borrow_mut().host_registered = true);
        Ok(())
    }

    fn build_view_model() -> Result<js_sys::Object, String> {
        let view_model = js_sys::Object::new();
        bind_callback(&view_model, "onStartup", |_, _| on_startup())?;
        bind_callback(&view_model, "onDataUpdaterPluginMessage", |plugin, data| {
            if let Some(plugin) = plugin.as_string() {
                on_plugin_message(plugin, data);
            }
        })?;
        bind_callback(&view_model, "saveProfile", |_, _| save_profile())?;
        bind_callback(&view_model, "deleteProfile", |_, _| delete_profile())?;
        bind_callback(&view_model, "submitNewSpool", |_, _| submit_new_spool())?;
        bind_callback(&view_model, "resetForm", |_, _| reset_form())?;
        bind_callback(&view_model, "showNewSpoolDialog", |_, _| show_new_spool_dialog())?;
        Ok(view_model)
    }

    fn bind_callback(
        target: &js_sys::Object,
        name: &str,
        callback: impl FnMut(JsValue, JsValue) + 'static,
    ) -> Result<(), String> {
        let closure = Closure::<dyn FnMut(JsValue, JsValue)>::wrap(Box::new(callback));
        set_property(target, name, closure.as_ref())?;
        HOST_CALLBACKS.with(|slot| slot.borrow_mut().push(closure));
        Ok(())
    }
