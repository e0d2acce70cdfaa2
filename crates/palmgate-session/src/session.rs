use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use palmgate_core::UserName;

use crate::schedule::ScheduledClass;

/// Attendance status recorded for a student check-in.
///
/// Only `Present` exists today; absences are simply students who never
/// scanned, so no record is written for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
}

/// One attendance entry: a student check-in at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Who checked in.
    pub student: UserName,

    /// When the check-in was recorded.
    pub timestamp: DateTime<Local>,

    /// Always `Present` (see [`AttendanceStatus`]).
    pub status: AttendanceStatus,
}

/// The single active class session.
///
/// The enrollment roster is fixed once the session starts; the attendance
/// log grows in check-in order. Sessions are never explicitly closed: a
/// later teacher scan replaces the whole value in system state.
///
/// # Examples
///
/// ```
/// use palmgate_core::UserName;
/// use palmgate_session::{ScheduledClass, Session};
///
/// let class = ScheduledClass::demo();
/// let teacher = UserName::new("AHMED").unwrap();
/// let mut session = Session::start(class, teacher);
///
/// let student = UserName::new("MOHAMMED").unwrap();
/// assert!(session.is_enrolled(&student));
///
/// session.mark_present(student);
/// assert_eq!(session.attendance().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    course: String,
    teacher: UserName,
    room: String,
    enrolled: BTreeSet<UserName>,
    attendance: Vec<AttendanceRecord>,
}

impl Session {
    /// Start a new session for a scheduled class with an empty attendance log.
    ///
    /// Unconditional: the caller is responsible for storing the returned
    /// value as the active session, overwriting any prior one.
    #[must_use]
    pub fn start(class: ScheduledClass, teacher: UserName) -> Self {
        debug!(course = %class.course, room = %class.room, %teacher, "starting class session");
        Self {
            course: class.course,
            teacher,
            room: class.room,
            enrolled: class.roster,
            attendance: Vec::new(),
        }
    }

    /// Course name (e.g. "Biology 101").
    #[must_use]
    pub fn course(&self) -> &str {
        &self.course
    }

    /// Teacher who started the session.
    #[must_use]
    pub fn teacher(&self) -> &UserName {
        &self.teacher
    }

    /// Room the class is held in (e.g. "Room 301").
    #[must_use]
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Fixed enrollment roster.
    #[must_use]
    pub fn enrolled(&self) -> &BTreeSet<UserName> {
        &self.enrolled
    }

    /// Membership test against the roster.
    #[must_use]
    pub fn is_enrolled(&self, student: &UserName) -> bool {
        self.enrolled.contains(student)
    }

    /// Append a `Present` record for the student, stamped now.
    ///
    /// Duplicate check-ins are NOT deduplicated: scanning twice appends two
    /// records. This is defined behavior, not an oversight.
    pub fn mark_present(&mut self, student: UserName) -> &AttendanceRecord {
        debug!(%student, course = %self.course, "marking student present");
        self.attendance.push(AttendanceRecord {
            student,
            timestamp: Local::now(),
            status: AttendanceStatus::Present,
        });
        // Just pushed, so the log is non-empty.
        self.attendance.last().unwrap()
    }

    /// Ordered attendance log (check-in order).
    #[must_use]
    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }
}
