pub mod slide;
