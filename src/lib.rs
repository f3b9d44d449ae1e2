pub mod config;
pub mod error;
pub mod glossary;
pub mod ir;
pub mod pipeline;
pub mod progress;
pub mod quality;
pub mod rules;
pub mod substitute;
pub mod textutil;
pub mod xlsx;
