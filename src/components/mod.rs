pub mod fab;
pub mod navigation;
pub mod templates;

pub use fab::{FabAction, FabComponent};
pub use navigation::NavigationComponent;
pub use templates::TemplateComponent;
