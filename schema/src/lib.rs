//! SJSON support for the NIDL compiler.
//!
//! SJSON is the relaxed JSON dialect NIDL schemas are written in: comments,
//! unquoted keys, `=` or `:` separators, optional commas, optional braces
//! around the root object and `[=[ raw ]=]` multi-line strings.
//!
//! ```
//! use nidl_schema::*;
//!
//! let root = parse(r#"
//!     // a component library
//!     namespace = "Game"
//!     components = { Transform = { position = "vec3" } }
//! "#).unwrap();
//!
//! assert_eq!(root.get("namespace"), Some(&Value::from("Game")));
//! assert_eq!(root.keys().collect::<Vec<_>>(), ["namespace", "components"]);
//! ```

pub mod error;
pub mod parser;
pub mod stream;
pub mod value;
pub mod writer;

pub use error::SjsonError;
pub use parser::parse;
pub use stream::{InputStream, Location};
pub use value::{Map, Value};
pub use writer::to_sjson_string;
