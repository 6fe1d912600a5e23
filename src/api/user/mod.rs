/*
* User API: registration, token login and profile management.
*/

pub mod handler;
pub mod routes;

pub use routes::{profile_routes, public_user_routes};
