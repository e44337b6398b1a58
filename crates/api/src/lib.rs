//! HTTP API: auth interceptor, error translation, and the routes hosted
//! behind them.

pub mod app;
pub mod authz;
pub mod context;
pub mod extract;
pub mod middleware;
