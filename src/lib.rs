pub mod assist;
pub mod document;
pub mod editor;
pub mod extract;
pub mod mode;
pub mod orchestrator;
pub mod selection;
pub mod voice;
