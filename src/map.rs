pub mod coordinates;
pub mod draw_mode;
pub mod editor;
pub mod features;
pub mod marker;
pub mod selection;
