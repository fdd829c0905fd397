pub mod factory;
pub mod request;
pub mod widget;

pub use factory::MapWidgetFactory;
pub use request::RequestGenerations;
pub use widget::{LoadOutcome, MapWidget, WidgetState};
