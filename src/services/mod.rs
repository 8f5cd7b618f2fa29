//! Business logic services.

pub mod application;
pub mod assets;
pub mod auth;
pub mod dashboard;
pub mod essay;
pub mod program;
pub mod scholarship;
pub mod snapshot;
pub mod student;
pub mod syllabus;
pub mod university_image;
