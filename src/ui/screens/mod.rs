pub(crate) mod cost_sharing;
pub(crate) mod customers;
pub(crate) mod dashboard;
pub(crate) mod projects;
pub(crate) mod reports;
