//! HTTP-side acquisition: the raw client and HTML form parsing.
//!
//! Everything here works without a browser. The renderer is only a
//! fallback for course pages whose lesson list is built client-side.

pub mod http_client;
pub mod login_form;
