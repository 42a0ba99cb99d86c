pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use handlers::AppState;
pub use server::{build_router, serve};
