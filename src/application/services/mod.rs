pub mod diff;
pub mod markdown;
pub mod shortcodes;
