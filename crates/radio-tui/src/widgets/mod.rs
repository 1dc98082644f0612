pub mod filter_input;
pub mod list_cursor;
pub mod pane_chrome;
pub mod status_bar;
pub mod text_field;
pub mod toast;
