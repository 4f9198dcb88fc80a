pub mod renderer;
pub mod session;
pub mod static_page;
