pub mod document;
pub mod grant;
pub mod profile;
