// HTTP interface: recipe questions and account signup/login

pub mod handlers;
pub mod models;
pub mod routes;
