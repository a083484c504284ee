pub mod backdrop;
pub mod colors;
pub mod tools;
