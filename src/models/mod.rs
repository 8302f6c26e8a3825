pub mod dashboard;
pub mod employee;
pub mod insight;
pub mod organization;
pub mod session;
pub mod task;
