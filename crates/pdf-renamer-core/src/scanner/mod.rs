pub mod walk;

pub use walk::{discover, Discovery};
