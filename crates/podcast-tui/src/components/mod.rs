pub mod episode_detail;
pub mod episode_list;
pub mod header;
pub mod help_overlay;
pub mod player_panel;
