pub mod data;
pub mod identifier;
pub mod nationality;
pub mod response;

pub use data::*;
pub use identifier::{ascii_digit, current_year, normalize_digits, DecodedIdentifierInfo, IdentifierCode, IdentifierComponents};
pub use nationality::NationalityTable;
pub use response::*;
