pub mod recovery;
pub mod result;
pub mod text_input;
pub mod trace;
