//! Core types and decision logic for the course-bidding administration tool.
//!
//! Everything in here is storage- and transport-agnostic: the quarter
//! registry helpers, the course listing filters, the authorization policy and
//! the [`store::CourseStore`] trait that backends implement.

pub mod actor;
pub mod bid;
pub mod course;
pub mod error;
pub mod listing;
pub mod policy;
pub mod quarter;
pub mod store;
pub mod user;
pub mod validation;

pub use error::{Error, Result};
