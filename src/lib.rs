#[allow(non_snake_case)]
pub mod Chemistry;
pub mod logging;
pub mod settings;
