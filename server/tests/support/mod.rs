pub mod app;
pub mod upstream;
