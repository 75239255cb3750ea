pub mod cache;
pub mod clean;
pub mod collapsed;
pub mod config;
pub mod constants;
pub mod dates;
pub mod domain;
pub mod error;
pub mod feed;
pub mod insights;
pub mod observability;
pub mod offers;
pub mod pipeline;
pub mod revenue_report;
pub mod state;
pub mod table;
pub mod workbook;
