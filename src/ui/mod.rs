//! Web-based user interface: the prediction form, the per-request
//! predict endpoint, and the model information page.

pub mod routes;
