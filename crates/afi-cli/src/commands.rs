pub mod design;
pub mod score;
