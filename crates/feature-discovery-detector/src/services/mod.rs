//! Category discovery services.

pub mod button;
pub mod component;
pub mod generic;
pub mod input;
pub mod navigation;

pub use button::ButtonDiscovery;
pub use component::ComponentDiscovery;
pub use generic::GenericDiscoveryService;
pub use input::{get_test_value_for_input, InputDiscovery, InputKind};
pub use navigation::NavigationDiscovery;
