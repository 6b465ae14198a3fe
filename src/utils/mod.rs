pub mod extract;
pub(crate) mod links;
pub mod validate;
