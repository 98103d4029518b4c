//! Mock school directory: an in-memory REST-shaped data source with
//! simulated latency and randomized failure injection. The dashboard treats
//! it exactly like a remote CRUD API.

pub mod api;
pub mod model;

pub use api::{Directory, DirectoryProfile};
pub use model::{
    AttendanceEntry, ExamEntry, FeeInvoice, HomeworkItem, Notice, Resource, StaffMember, Student,
};

use crate::error::AppResult;

/// Load the small demo dataset the shell starts with. Bulk data generation
/// is deliberately not part of this crate; these are just enough rows to
/// make every view render.
pub fn seed_demo(dir: &Directory) -> AppResult<()> {
    let today = chrono::Utc::now().date_naive();
    let records = model::demo_records(today)?;
    for (resource, rows) in records {
        dir.load(resource, rows);
    }
    Ok(())
}
