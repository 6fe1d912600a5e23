/*
* Recipe API: listing with tag/ingredient filters, CRUD and image upload.
*/

pub mod handler;
pub mod routes;

pub use routes::recipe_routes;
