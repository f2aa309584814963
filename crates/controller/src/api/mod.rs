mod handlers;
mod server;

pub use server::{bind, router, serve};
