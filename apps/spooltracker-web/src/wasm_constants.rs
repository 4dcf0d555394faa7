pub(crate) const CONFIG_GLOBAL: &str = "SPOOLTRACKER_CONFIG";
pub(crate) const VIEW_MODEL_REGISTRY_GLOBAL: &str = "OCTOPRINT_VIEWMODELS";
pub(crate) const VIEW_MODEL_ELEMENT: &str = "#sidebar_plugin_spooltracker";
pub(crate) const NOTIFY_GLOBAL: &str = "PNotify";
pub(crate) const JQUERY_GLOBAL: &str = "jQuery";
pub(crate) const STATE_EVENT_NAME: &str = "spooltracker:state";
pub(crate) const STYLE_ELEMENT_ID: &str = "spooltracker-sidebar-style";
pub(crate) const COLOR_PREVIEW_CSS: &str = "
.spooltracker-sidebar .color-preview {
    display: inline-block;
    width: 16px;
    height: 16px;
    border: 1px solid #ccc;
    margin-right: 5px;
    vertical-align: middle;
}
";
