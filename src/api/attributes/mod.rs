/*
* Recipe attributes: the caller's tags and ingredients.
*/

pub mod handler;
pub mod routes;

pub use routes::attribute_routes;
