pub mod editor;
pub mod jobs;
pub mod nav;
