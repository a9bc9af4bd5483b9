//! Dotted key-path access over JSON objects.
//!
//! A key path is a `.`-separated list of object keys, e.g.
//! `permissions.allow`. Empty segments are kept literally: `a..b` addresses
//! the key `""` inside `a`, and the empty path addresses the key `""` at the
//! top level.
//!
//! # Operations
//!
//! - [`get_at_path`] / [`lookup`]: read, distinguishing a present `null`
//!   from an absent key
//! - [`set_at_path`]: write, creating intermediate objects and replacing
//!   non-object intermediates
//! - [`delete_at_path`]: remove a leaf; a missing path is a no-op
//!
//! The borrowing forms never touch their argument. The `_owned` forms
//! consume it and rebuild only the objects along the path; every sibling
//! subtree is moved into the result untouched.

pub mod path;

pub use path::{
    delete_at_path, delete_at_path_owned, get_at_path, lookup, set_at_path, set_at_path_owned,
    split_path, PATH_SEPARATOR,
};
