pub mod domain;
pub mod eia;
