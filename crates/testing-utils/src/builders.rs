//! Test data builders for creating test entities
//!
//! This module provides builder patterns for creating test data with
//! sensible defaults and easy customization.

use chrono::{DateTime, Utc};
use reports_core::{
    Department, ObjectCategory, Place, Report, ReportPriority, ReportStatus, SubjectObject, Worker,
};

/// Builder for creating test Report entities
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            report: Report::new("Broken chair in room 101", "reporter-1", Some("worker-1".to_string())),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.report.id = id;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.report.description = description.to_string();
        self
    }

    pub fn with_status(mut self, status: ReportStatus) -> Self {
        self.report.status = status;
        self
    }

    pub fn with_priority(mut self, priority: ReportPriority) -> Self {
        self.report.priority = priority;
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.report.comment = comment.to_string();
        self
    }

    pub fn with_attachments(mut self, refs: &[&str]) -> Self {
        self.report.attachment_refs = refs.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn assigned_to(mut self, worker_id: &str) -> Self {
        self.report.assigned_worker_id = Some(worker_id.to_string());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.report.assigned_worker_id = None;
        self
    }

    pub fn created_by(mut self, creator_id: &str) -> Self {
        self.report.creator_id = creator_id.to_string();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.report.created_at = created_at;
        self
    }

    pub fn build(self) -> Report {
        self.report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Worker entities
pub struct WorkerBuilder {
    worker: Worker,
}

impl WorkerBuilder {
    pub fn new() -> Self {
        Self {
            worker: Worker::new("worker-1", Department::Maintenance, "technician", "worker-1@example.org"),
        }
    }

    /// Sets the id and derives a matching contact address
    pub fn with_id(mut self, id: &str) -> Self {
        self.worker.id = id.to_string();
        self.worker.contact = format!("{id}@example.org");
        self
    }

    pub fn with_department(mut self, department: Department) -> Self {
        self.worker.department = department;
        self
    }

    pub fn with_rank(mut self, rank: &str) -> Self {
        self.worker.rank = rank.to_string();
        self
    }

    pub fn with_contact(mut self, contact: &str) -> Self {
        self.worker.contact = contact.to_string();
        self
    }

    pub fn build(self) -> Worker {
        self.worker
    }
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Place entities
pub struct PlaceBuilder {
    place: Place,
}

impl PlaceBuilder {
    pub fn new() -> Self {
        Self {
            place: Place::new("Library", 2),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.place.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.place.name = name.to_string();
        self
    }

    pub fn with_floor(mut self, floor: i32) -> Self {
        self.place.floor = floor;
        self
    }

    pub fn build(self) -> Place {
        self.place
    }
}

impl Default for PlaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test SubjectObject entities
pub struct SubjectObjectBuilder {
    object: SubjectObject,
}

impl SubjectObjectBuilder {
    pub fn new() -> Self {
        Self {
            object: SubjectObject::new("Chair", ObjectCategory::Furniture, 1, 1),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.object.name = name.to_string();
        self
    }

    pub fn with_category(mut self, category: ObjectCategory) -> Self {
        self.object.category = category;
        self
    }

    pub fn at_place(mut self, place_id: i64) -> Self {
        self.object.place_id = place_id;
        self
    }

    pub fn for_report(mut self, report_id: i64) -> Self {
        self.object.report_id = report_id;
        self
    }

    pub fn build(self) -> SubjectObject {
        self.object
    }
}

impl Default for SubjectObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
