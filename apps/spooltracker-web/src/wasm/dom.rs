use super::*;

    /// The live sidebar, addressed by element id.
    #[derive(Debug, Clone)]
    pub struct DomPanelTree {
        document: Document,
    }

    impl DomPanelTree {
        pub fn new(document: Document) -> Self {
            Self { document }
        }

        pub fn from_window() -> Result<Self, String> {
            document().map(Self::new)
        }
    }

    impl PanelTree for DomPanelTree {
        type Node = Element;

        fn find(&self, id: &str) -> Option<Element> {
            self.document.get_element_by_id(id)
        }

        fn is_next_sibling(&self, anchor: &Element, subject: &Element) -> bool {
            anchor
                .next_sibling()
                .is_some_and(|node| node.is_same_node(Some(&**subject)))
        }

        fn insert_after(&self, anchor: &Element, subject: &Element) -> Result<(), String> {
            let parent = anchor
                .parent_node()
                .ok_or_else(|| "anchor has no parent".to_string())?;
            parent
                .insert_before(subject, anchor.next_sibling().as_ref())
                .map(drop)
                .map_err(|_| "failed to move panel after anchor".to_string())
        }
    }

    pub(super) fn document() -> Result<Document, String> {
        web_sys::window()
            .ok_or_else(|| "window is unavailable".to_string())?
            .document()
            .ok_or_else(|| "document is unavailable".to_string())
    }

    pub(super) fn with_enforcer<R>(
        run: impl FnOnce(&mut OrderEnforcer, &DomPanelTree) -> R,
    ) -> Option<R> {
        let tree = DomPanelTree::from_window().ok()?;
        ENFORCER.with(|slot| slot.borrow_mut().as_mut().map(|enforcer| run(enforcer, &tree)))
    }

    /// Attaches the mutation watch once the document has parsed.
    pub(super) fn watch_after_document_load() {
        let Ok(document) = document() else {
            return;
        };
        if document.ready_state() != "loading" {
            attach_mutation_observer();
            return;
        }

        DOCUMENT_READY_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                attach_mutation_observer();
            }));
            if document
                .add_event_listener_with_callback(
                    "DOMContentLoaded",
                    callback.as_ref().unchecked_ref(),
                )
                .is_err()
            {
                tracing::warn!("failed to listen for DOMContentLoaded");
                return;
            }
            *slot.borrow_mut() = Some(callback);
        });
    }

    fn attach_mutation_observer() {
        if let Err(error) = try_attach_mutation_observer() {
            tracing::debug!(%error, "sidebar mutation watch not attached");
        }
        record_order_stats();
    }

    fn try_attach_mutation_observer() -> Result<(), String> {
        if MUTATION_OBSERVER.with(|slot| slot.borrow().is_some()) {
            return Ok(());
        }
        let container_id = with_enforcer(|enforcer, _| enforcer.container_id().to_string())
            .ok_or_else(|| "order enforcer is not installed".to_string())?;
        let container = document()?
            .get_element_by_id(&container_id)
            .ok_or_else(|| format!("#{container_id} is missing"))?;

        let callback: MutationCallback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::wrap(
            Box::new(|records: js_sys::Array, _observer: MutationObserver| {
                let records = records.length() as usize;
                with_enforcer(|enforcer, tree| enforcer.on_mutations(tree, records));
            }),
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|_| "failed to create mutation observer".to_string())?;
        let options = web_sys::MutationObserverInit::new();
        options.set_child_list(true);
        observer
            .observe_with_options(&container, &options)
            .map_err(|_| format!("failed to observe #{container_id}"))?;

        with_enforcer(|enforcer, _| {
            enforcer.on_document_loaded();
        });
        MUTATION_OBSERVER.with(|slot| *slot.borrow_mut() = Some((observer, callback)));
        tracing::debug!(%container_id, "watching sidebar for reinsertion");
        Ok(())
    }

    pub(super) fn inject_color_preview_style() -> Result<(), String> {
        let document = document()?;
        if document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
            return Ok(());
        }
        let style = document
            .create_element("style")
            .map_err(|_| "failed to create style element".to_string())?;
        style.set_id(STYLE_ELEMENT_ID);
        style.set_text_content(Some(COLOR_PREVIEW_CSS));
        let head = document
            .head()
            .ok_or_else(|| "document head is unavailable".to_string())?;
        head.append_child(&style)
            .map(drop)
            .map_err(|_| "failed to append style element".to_string())
    }

    /// Moves the entry dialog under `<body>` so the sidebar's overflow does not clip it.
    pub(super) fn relocate_dialog_to_body(dialog_id: &str) -> Result<(), String> {
        let document = document()?;
        let dialog = document
            .get_element_by_id(dialog_id)
            .ok_or_else(|| format!("#{dialog_id} is missing"))?;
        let body = document
            .body()
            .ok_or_else(|| "document body is unavailable".to_string())?;
        if dialog
            .parent_node()
            .is_some_and(|parent| parent.is_same_node(Some(&**body)))
        {
            return Ok(());
        }
        body.append_child(&dialog)
            .map(drop)
            .map_err(|_| format!("failed to move #{dialog_id} to body"))
    }

    pub(super) fn set_background_color(element_id: &str, color_hex: &str) -> Result<(), String> {
        let element = document()?
            .get_element_by_id(element_id)
            .ok_or_else(|| format!("#{element_id} is missing"))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| format!("#{element_id} is not an HtmlElement"))?;
        element
            .style()
            .set_property("background-color", color_hex)
            .map_err(|_| format!("failed to style #{element_id}"))
    }
