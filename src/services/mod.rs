pub mod hall_service;
pub mod movie_service;
pub mod show_time_service;

pub use hall_service::HallService;
pub use movie_service::MovieService;
pub use show_time_service::ShowTimeService;
