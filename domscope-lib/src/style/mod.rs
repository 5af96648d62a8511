pub mod css_matcher;
pub mod owned_css;
pub mod sheet;
pub mod shorthand;
