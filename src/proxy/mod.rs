pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod upstream;
