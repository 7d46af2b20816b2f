pub mod api;
pub mod editor;
pub mod error;
pub mod forms;
pub mod logging;
pub mod merge;
pub mod page;
pub mod serialize;
pub mod shape;
pub mod stub;
pub mod types;
pub mod ui;
