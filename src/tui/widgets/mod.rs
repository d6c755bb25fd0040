pub mod color;
pub mod confirm_delete;
pub mod form;
pub mod sidebar;
pub mod stats;
pub mod status_bar;
pub mod task_list;
