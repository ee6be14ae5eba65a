pub mod hall_controller;
pub mod movie_controller;
pub mod show_time_controller;
