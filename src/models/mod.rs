pub mod hall_model;
pub mod movie_model;
pub mod reservation_model;
pub mod show_time_model;
