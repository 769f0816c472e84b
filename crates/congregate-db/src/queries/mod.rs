pub mod activities;
pub mod attendance;
pub mod attendance_statuses;
pub mod offices;
pub mod recurrences;
pub mod statistics;
pub mod users;

pub use activities::ActivityQueries;
pub use attendance::AttendanceQueries;
pub use attendance_statuses::AttendanceStatusQueries;
pub use offices::OfficeQueries;
pub use recurrences::RecurrenceQueries;
pub use statistics::StatisticsQueries;
pub use users::UserQueries;
