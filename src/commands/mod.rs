pub mod logs;
pub mod text;
