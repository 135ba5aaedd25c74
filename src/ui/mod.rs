//! Panels around the 3D view

pub mod legend;
pub mod sidebar;
pub mod status;
pub mod view_toggle;

pub use legend::show_legend;
pub use sidebar::{show_sidebar, SidebarAction};
pub use status::{error_view, loading_view};
pub use view_toggle::show_view_toggle;
