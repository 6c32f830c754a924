pub mod country_links;
pub mod panel;
pub mod store;
pub mod subscription_service;
pub mod tv_service;
pub mod vless;
