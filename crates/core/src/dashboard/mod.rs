//! Filtered, paginated views for the admin and professor panels.

mod paginator;
mod service;

pub use paginator::{parse_page_number, Page, Paginator};
pub use service::{AdminDashboard, DashboardQuery, DashboardService, ProfessorDashboard};
