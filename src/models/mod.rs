pub mod appointment;
pub mod blog_post;
pub mod booking;
pub mod doctor;
pub mod enums;
pub mod filters;
pub mod health_record;
pub mod lab;
pub mod onboarding;
pub mod timestamp;

pub use appointment::*;
pub use blog_post::*;
pub use booking::*;
pub use doctor::*;
pub use enums::*;
pub use filters::*;
pub use health_record::*;
pub use lab::*;
pub use onboarding::*;
