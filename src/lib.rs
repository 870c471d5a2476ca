pub mod configuration;
pub mod error_handling;
pub mod interfaces;
pub mod seeder;
pub mod storage;
pub mod web_interface;
