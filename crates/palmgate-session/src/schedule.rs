use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use palmgate_core::UserName;

/// A class as it appears on the school schedule: course, room, and the
/// roster of enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledClass {
    pub course: String,
    pub room: String,
    pub roster: BTreeSet<UserName>,
}

impl ScheduledClass {
    /// The fixed demo class: Biology 101 in Room 301 with the roster
    /// MOHAMMED, SARA, AHMED.
    #[must_use]
    pub fn demo() -> Self {
        let roster = ["MOHAMMED", "SARA", "AHMED"]
            .iter()
            .map(|n| UserName::new(n).expect("demo roster names are valid"))
            .collect();
        Self {
            course: "Biology 101".to_string(),
            room: "Room 301".to_string(),
            roster,
        }
    }
}

/// Schedule lookup the teacher branch consults before starting a session.
///
/// The demo schedule assigns every teacher the same fixed class, mirroring
/// the scripted scenario. A richer schedule would key classes by teacher
/// and time slot; the lookup interface would not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    class: ScheduledClass,
}

impl Schedule {
    /// Build a schedule that returns the given class for every teacher.
    #[must_use]
    pub fn with_class(class: ScheduledClass) -> Self {
        Self { class }
    }

    /// The demo schedule (see [`ScheduledClass::demo`]).
    #[must_use]
    pub fn demo() -> Self {
        Self::with_class(ScheduledClass::demo())
    }

    /// Look up the scheduled class for a teacher.
    #[must_use]
    pub fn class_for(&self, _teacher: &UserName) -> ScheduledClass {
        self.class.clone()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_class_contents() {
        let class = ScheduledClass::demo();
        assert_eq!(class.course, "Biology 101");
        assert_eq!(class.room, "Room 301");
        assert_eq!(class.roster.len(), 3);
    }

    #[test]
    fn test_schedule_returns_class_for_any_teacher() {
        let schedule = Schedule::demo();
        let a = schedule.class_for(&UserName::new("AHMED").unwrap());
        let b = schedule.class_for(&UserName::new("FATIMA").unwrap());
        assert_eq!(a, b);
    }
}
