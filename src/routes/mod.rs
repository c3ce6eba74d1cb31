pub mod html;
pub mod pages;

pub use pages::page_routes;
