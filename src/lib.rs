pub mod api;
pub mod bindings;
pub mod comments;
pub mod compile;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod imports;
pub mod normalize;
pub mod options;
pub mod resolver;
pub mod scanner;
pub mod utils;

pub use api::{from_str, parse, parse_file, ParsedDocument};
pub use error::{ErrorKind, TsonError};
pub use options::ParseOptions;
