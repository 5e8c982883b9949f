pub mod annual;
pub mod costs;
pub mod report;
pub mod settings;
pub mod setup;
pub mod ui;
