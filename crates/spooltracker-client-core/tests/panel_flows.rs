use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::json;
use spooltracker_client_core::{
    CommandError, CommandRequest, CommandResponse, CommandTransport, DraftEdit, Notice,
    OrderEnforcer, Panel, PanelError, PanelSurface, PanelTree, Placement, SaveProfileData,
    Snapshot, Spool, SpoolAttributes, StartDirective, TickDirective, Trigger, UpdateSource,
    ValidationError,
};

#[derive(Default)]
struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<CommandResponse, CommandError>>>,
    sent: RefCell<Vec<CommandRequest>>,
    snapshot: RefCell<Option<Snapshot>>,
}

#[async_trait(?Send)]
impl CommandTransport for ScriptedTransport {
    async fn send_command(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandResponse, CommandError> {
        self.sent.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(CommandError::Timeout { after_ms: 10_000 }))
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, CommandError> {
        self.snapshot
            .borrow_mut()
            .take()
            .ok_or(CommandError::Transport {
                message: "offline".to_string(),
            })
    }
}

#[derive(Default)]
struct RecordingSurface {
    notices: RefCell<Vec<Notice>>,
    previews: RefCell<Vec<String>>,
    dialog_open: Cell<bool>,
}

#[async_trait(?Send)]
impl PanelSurface for RecordingSurface {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }

    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }

    fn show_entry_dialog(&self) {
        self.dialog_open.set(true);
    }

    fn hide_entry_dialog(&self) {
        self.dialog_open.set(false);
    }

    fn refresh_color_preview(&self, color_hex: &str) {
        self.previews.borrow_mut().push(color_hex.to_string());
    }
}

/// Children of the sidebar, with a mutation counter.
#[derive(Default)]
struct Sidebar {
    children: RefCell<Vec<&'static str>>,
    mutations: Cell<usize>,
}

impl Sidebar {
    fn position(&self, id: &str) -> Option<usize> {
        self.children.borrow().iter().position(|child| *child == id)
    }
}

impl PanelTree for Sidebar {
    type Node = usize;

    fn find(&self, id: &str) -> Option<usize> {
        self.position(id)
    }

    fn is_next_sibling(&self, anchor: &usize, subject: &usize) -> bool {
        *subject == *anchor + 1
    }

    fn insert_after(&self, anchor: &usize, subject: &usize) -> Result<(), String> {
        let mut children = self.children.borrow_mut();
        let moved = children.remove(*subject);
        let target = if *subject < *anchor { *anchor } else { *anchor + 1 };
        children.insert(target, moved);
        self.mutations.set(self.mutations.get() + 1);
        Ok(())
    }
}

const ANCHOR: &str = "state_wrapper";
const SUBJECT: &str = "sidebar_plugin_spooltracker_wrapper";

fn enforcer() -> OrderEnforcer {
    OrderEnforcer::new(ANCHOR, SUBJECT, "sidebar")
}

fn panel() -> Panel<ScriptedTransport, RecordingSurface> {
    Panel::new(
        "spooltracker",
        ScriptedTransport::default(),
        RecordingSurface::default(),
    )
}

#[test]
fn repeated_reconcile_when_ordered_performs_no_mutation() {
    let sidebar = Sidebar::default();
    sidebar
        .children
        .borrow_mut()
        .extend(["connection_wrapper", ANCHOR, SUBJECT]);
    let mut enforcer = enforcer();

    for trigger in [Trigger::Immediate, Trigger::RetryTick, Trigger::Mutations] {
        for _ in 0..10 {
            assert_eq!(enforcer.reconcile(&sidebar, trigger), Placement::InPlace);
        }
    }

    assert_eq!(sidebar.mutations.get(), 0);
}

#[test]
fn late_injection_is_ordered_within_the_retry_window() {
    for injected_at in [0_u32, 17, 32] {
        let sidebar = Sidebar::default();
        sidebar.children.borrow_mut().push(SUBJECT);
        let mut enforcer = enforcer();
        assert_eq!(
            enforcer.start(&sidebar),
            StartDirective::StartRetryTimer { period_ms: 300 }
        );

        let mut tick = 0;
        loop {
            if tick == injected_at {
                sidebar.children.borrow_mut().push(ANCHOR);
            }
            tick += 1;
            if enforcer.on_retry_tick(&sidebar) == TickDirective::Cancel {
                break;
            }
        }

        assert!(tick < 34, "settled at tick {tick} after injection at {injected_at}");
        assert_eq!(*sidebar.children.borrow(), vec![ANCHOR, SUBJECT]);
    }
}

#[test]
fn mutation_callback_restores_order_after_external_reinsertion() {
    let sidebar = Sidebar::default();
    sidebar
        .children
        .borrow_mut()
        .extend([ANCHOR, SUBJECT, "files_wrapper"]);
    let mut enforcer = enforcer();
    assert_eq!(enforcer.start(&sidebar), StartDirective::Done);
    enforcer.on_document_loaded();

    // Another plugin re-inserts the panel at the end of the sidebar.
    {
        let mut children = sidebar.children.borrow_mut();
        children.retain(|child| *child != SUBJECT);
        children.push(SUBJECT);
    }

    assert_eq!(enforcer.on_mutations(&sidebar, 2), Placement::Moved);
    assert_eq!(
        *sidebar.children.borrow(),
        vec![ANCHOR, SUBJECT, "files_wrapper"]
    );
    assert_eq!(enforcer.on_mutations(&sidebar, 2), Placement::InPlace);
    assert_eq!(sidebar.mutations.get(), 1);
}

#[test]
fn push_patch_changes_only_the_carried_field() {
    let panel = panel();
    panel.handle_push(
        "spooltracker",
        &json!({
            "remaining_g": 100,
            "spool_capacity_g": 1000,
            "filament_type": "PLA",
            "color": "#fff",
            "manufacturer": "A"
        }),
    );

    panel.handle_push("spooltracker", &json!({"remaining_g": 80}));

    panel.with_state(|state| {
        assert_eq!(
            *state.store.spool(),
            Spool {
                remaining_weight_g: 80.0,
                capacity_weight_g: 1000.0,
                filament_type: "PLA".to_string(),
                color_hex: "#fff".to_string(),
                manufacturer: "A".to_string(),
            }
        );
    });
}

#[test]
fn saved_profile_round_trips_through_the_response_catalog() {
    let panel = panel();
    let form = panel.form();
    form.edit(DraftEdit::ProfileName("P1".to_string())).expect("edit");
    form.edit(DraftEdit::Capacity("500".to_string())).expect("edit");
    form.edit(DraftEdit::FilamentType("PETG".to_string())).expect("edit");
    form.set_color("#00f");
    form.edit(DraftEdit::Manufacturer("B".to_string())).expect("edit");

    let attributes = SpoolAttributes {
        capacity_weight_g: 500.0,
        filament_type: "PETG".to_string(),
        color_hex: "#00f".to_string(),
        manufacturer: "B".to_string(),
    };
    panel.transport().responses.borrow_mut().push_back(Ok(CommandResponse {
        success: true,
        error: None,
        profiles: Some([("P1".to_string(), attributes.clone())].into_iter().collect()),
    }));

    pollster::block_on(panel.profiles().save_profile()).expect("saved");

    assert_eq!(
        panel.transport().sent.borrow().as_slice(),
        [CommandRequest::SaveProfile(SaveProfileData {
            name: "P1".to_string(),
            attributes: attributes.clone(),
        })]
    );
    panel.with_state(|state| {
        let profiles = state.store.profiles();
        assert_eq!(profiles.len(), 1);
        let saved = profiles.get("P1").expect("P1 saved");
        assert_eq!(saved.attributes, attributes);

        assert_eq!(state.draft.profile_name, "");
        assert_eq!(state.draft.fields.capacity_text, "500");
        assert_eq!(state.draft.fields.filament_type, "PETG");
        assert_eq!(state.draft.fields.color_hex, "#00f");
        assert_eq!(state.draft.fields.manufacturer, "B");
        assert_eq!(state.store.last_source(), Some(UpdateSource::Command));
    });
    assert_eq!(
        panel.surface().previews.borrow().as_slice(),
        ["#00f".to_string()]
    );
    let notices = panel.surface().notices.borrow();
    assert_eq!(
        notices.last().map(|notice| notice.text.as_str()),
        Some("Profile saved successfully")
    );
}

#[test]
fn submit_rejects_non_positive_or_non_numeric_capacity() {
    for capacity in ["0", "-5", "abc"] {
        let panel = panel();
        panel
            .form()
            .edit(DraftEdit::Capacity(capacity.to_string()))
            .expect("edit");

        let error = pollster::block_on(panel.form().submit_new_spool()).expect_err("invalid");

        assert_eq!(
            error,
            PanelError::Validation(ValidationError::InvalidCapacity),
            "capacity {capacity:?}"
        );
        assert!(panel.transport().sent.borrow().is_empty());
        assert_eq!(
            panel.surface().notices.borrow()[0].text,
            "Spool capacity must be greater than 0"
        );
    }

    let panel = panel();
    panel
        .form()
        .edit(DraftEdit::Capacity("0.001".to_string()))
        .expect("edit");
    panel.transport().responses.borrow_mut().push_back(Ok(CommandResponse {
        success: true,
        ..CommandResponse::default()
    }));

    panel.form().open_entry_dialog();
    pollster::block_on(panel.form().submit_new_spool()).expect("submitted");

    assert_eq!(panel.transport().sent.borrow().len(), 1);
    assert!(!panel.surface().dialog_open.get());
}

#[test]
fn remaining_weight_renders_with_one_decimal() {
    let panel = panel();

    panel.handle_push("spooltracker", &json!({"remaining_g": 7.532}));
    panel.with_state(|state| assert_eq!(state.store.formatted_remaining(), "7.5g"));

    panel.handle_push("spooltracker", &json!({"remaining_g": 0}));
    panel.with_state(|state| assert_eq!(state.store.formatted_remaining(), "0.0g"));
}

#[test]
fn late_snapshot_overwrites_an_earlier_push() {
    let panel = panel();
    let snapshot: Snapshot = serde_json::from_value(json!({
        "remaining_g": 900,
        "spool_capacity_g": 1000,
        "filament_type": "PLA",
        "manufacturer": "A",
        "profiles": {"Basic": {"spool_capacity_g": 1000, "filament_type": "PLA", "color": "#000000", "manufacturer": "A"}}
    }))
    .expect("snapshot");
    *panel.transport().snapshot.borrow_mut() = Some(snapshot);

    panel.handle_push("spooltracker", &json!({"remaining_g": 850}));
    pollster::block_on(panel.load_snapshot()).expect("snapshot applied");

    panel.with_state(|state| {
        assert_eq!(state.store.spool().remaining_weight_g, 900.0);
        assert_eq!(state.store.spool().color_hex, "#000000");
        assert_eq!(state.store.profiles().names(), vec!["Basic"]);
        assert_eq!(state.store.revision(), 2);
        assert_eq!(state.store.last_source(), Some(UpdateSource::Snapshot));
    });
}

#[test]
fn foreign_push_namespace_leaves_state_alone() {
    let panel = panel();
    panel.handle_push("octolapse", &json!({"remaining_g": 1}));
    panel.with_state(|state| assert_eq!(state.store.revision(), 0));
}
