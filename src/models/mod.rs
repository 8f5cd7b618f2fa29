//! Database models and DTOs for all domain entities.

pub mod application;
pub mod essay;
pub mod pagination;
pub mod program;
pub mod scholarship;
pub mod student;
pub mod syllabus;
pub mod university;
