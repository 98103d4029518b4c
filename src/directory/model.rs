use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// The directory's resource collections, one per dashboard data domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Students,
    Staff,
    Attendance,
    Fees,
    Homework,
    Exams,
    Notices,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Students,
        Resource::Staff,
        Resource::Attendance,
        Resource::Fees,
        Resource::Homework,
        Resource::Exams,
        Resource::Notices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Students => "students",
            Resource::Staff => "staff",
            Resource::Attendance => "attendance",
            Resource::Fees => "fees",
            Resource::Homework => "homework",
            Resource::Exams => "exams",
            Resource::Notices => "notices",
        }
    }

    pub fn parse(s: &str) -> Option<Resource> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class: String,
    pub guardian: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub title: String,
    pub department: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub id: String,
    pub student_id: String,
    pub student: String,
    pub date: NaiveDate,
    /// present | absent | late
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeInvoice {
    pub id: String,
    pub student_id: String,
    pub student: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    /// paid | due | overdue
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeworkItem {
    pub id: String,
    pub class: String,
    pub subject: String,
    pub title: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamEntry {
    pub id: String,
    pub class: String,
    pub subject: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub body: String,
    /// all | staff | students | parents
    pub audience: String,
    pub posted_at: DateTime<Utc>,
}

/// Serialize any typed record into the directory's row shape.
pub fn to_record<T: Serialize>(record: &T) -> AppResult<Value> {
    serde_json::to_value(record).map_err(|e| AppError::internal(format!("serializing record: {}", e)))
}

/// A handful of rows per resource, enough for every dashboard view.
pub fn demo_records(today: NaiveDate) -> AppResult<Vec<(Resource, Vec<Value>)>> {
    let students = vec![
        Student { id: "stu-001".into(), name: "Lena Hoffmann".into(), class: "7A".into(), guardian: "Maria Keller".into(), email: "lena.h@school.edu".into() },
        Student { id: "stu-002".into(), name: "Tom Barker".into(), class: "7A".into(), guardian: "James Barker".into(), email: "tom.b@school.edu".into() },
        Student { id: "stu-003".into(), name: "Aisha Diallo".into(), class: "8B".into(), guardian: "Fatou Diallo".into(), email: "aisha.d@school.edu".into() },
        Student { id: "stu-004".into(), name: "Marco Rossi".into(), class: "9C".into(), guardian: "Elena Rossi".into(), email: "marco.r@school.edu".into() },
    ];
    let staff = vec![
        StaffMember { id: "stf-001".into(), name: "Grace Lin".into(), title: "Teacher".into(), department: "Mathematics".into(), email: "teacher@school.edu".into() },
        StaffMember { id: "stf-002".into(), name: "Daniel Okafor".into(), title: "Principal".into(), department: "Administration".into(), email: "principal@school.edu".into() },
        StaffMember { id: "stf-003".into(), name: "Priya Nair".into(), title: "Accountant".into(), department: "Finance".into(), email: "accounts@school.edu".into() },
    ];
    let attendance = vec![
        AttendanceEntry { id: "att-001".into(), student_id: "stu-001".into(), student: "Lena Hoffmann".into(), date: today, status: "present".into() },
        AttendanceEntry { id: "att-002".into(), student_id: "stu-002".into(), student: "Tom Barker".into(), date: today, status: "late".into() },
        AttendanceEntry { id: "att-003".into(), student_id: "stu-003".into(), student: "Aisha Diallo".into(), date: today, status: "absent".into() },
    ];
    let fees = vec![
        FeeInvoice { id: "fee-001".into(), student_id: "stu-001".into(), student: "Lena Hoffmann".into(), amount: 420.0, due_date: today + Duration::days(14), status: "due".into() },
        FeeInvoice { id: "fee-002".into(), student_id: "stu-002".into(), student: "Tom Barker".into(), amount: 420.0, due_date: today - Duration::days(7), status: "overdue".into() },
        FeeInvoice { id: "fee-003".into(), student_id: "stu-004".into(), student: "Marco Rossi".into(), amount: 380.0, due_date: today - Duration::days(30), status: "paid".into() },
    ];
    let homework = vec![
        HomeworkItem { id: "hw-001".into(), class: "7A".into(), subject: "Mathematics".into(), title: "Fractions worksheet".into(), due_date: today + Duration::days(2) },
        HomeworkItem { id: "hw-002".into(), class: "8B".into(), subject: "History".into(), title: "Essay: the printing press".into(), due_date: today + Duration::days(5) },
    ];
    let exams = vec![
        ExamEntry { id: "exm-001".into(), class: "7A".into(), subject: "Mathematics".into(), date: today + Duration::days(21) },
        ExamEntry { id: "exm-002".into(), class: "9C".into(), subject: "Physics".into(), date: today + Duration::days(28) },
    ];
    let notices = vec![
        Notice { id: "ntc-001".into(), title: "Sports day".into(), body: "Annual sports day on the main field; classes suspended after noon.".into(), audience: "all".into(), posted_at: Utc::now() },
        Notice { id: "ntc-002".into(), title: "Fee reminder".into(), body: "Second-term invoices are due within two weeks.".into(), audience: "parents".into(), posted_at: Utc::now() },
    ];

    fn rows<T: Serialize>(items: &[T]) -> AppResult<Vec<Value>> {
        items.iter().map(to_record).collect()
    }

    Ok(vec![
        (Resource::Students, rows(&students)?),
        (Resource::Staff, rows(&staff)?),
        (Resource::Attendance, rows(&attendance)?),
        (Resource::Fees, rows(&fees)?),
        (Resource::Homework, rows(&homework)?),
        (Resource::Exams, rows(&exams)?),
        (Resource::Notices, rows(&notices)?),
    ])
}
