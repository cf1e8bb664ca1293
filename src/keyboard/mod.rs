pub mod charset;
pub mod display;
