pub mod decode;
pub mod types;
