//! Browser-independent core of the Spool Tracker sidebar panel.

pub mod command;
pub mod config;
pub mod draft;
pub mod form;
pub mod model;
pub mod order;
pub mod panel;
pub mod profiles;
pub mod push;
pub mod store;
pub mod surface;

pub use command::{
    CommandError, CommandRequest, CommandResponse, CommandTransport, DeleteProfileData,
    SaveProfileData, decode_response_body,
};
pub use config::{ConfigError, PanelConfig};
pub use draft::{Draft, DraftEdit, DraftFields, DraftReaction, ValidationError, parse_float_prefix};
pub use form::FormController;
pub use model::{
    Profile, ProfileCatalog, Snapshot, Spool, SpoolAttributes, SpoolPatch, format_remaining,
};
pub use order::{
    EnforcerStats, OrderEnforcer, OrderState, PanelTree, Placement, StartDirective, TickDirective,
    Trigger,
};
pub use panel::{Panel, PanelError, PanelState};
pub use profiles::{DeleteOutcome, ProfileLookupError, ProfileManager, load_profile_into_draft};
pub use push::{PushOutcome, PushReconciler};
pub use store::{SpoolField, StateStore, StoreEvent, SubscriptionId, UpdateSource};
pub use surface::{Notice, NoticeKind, PanelSurface};
