pub mod obstacle_course;
pub mod two_way_choice;

pub use obstacle_course::{Block, CourseConfig, ObstacleCourse};
pub use two_way_choice::TwoWayChoice;
