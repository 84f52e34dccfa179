//! Procedural macros for relmeta
//!
//! This crate provides the `Record` derive.

mod attributes;
mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for `Record` - generates the static field table and field accessors
///
/// Field attributes:
/// - `#[db("column")]` storage column (defaults to the field name)
/// - `#[db(skip)]` not storage-mapped; the field is `Default`-initialized on load
/// - `#[db(flatten)]` embedded record whose fields are promoted
/// - `#[relmeta(...)]` key, version and relation tokens, e.g.
///   `#[relmeta(pk, auto_incr)]`, `#[relmeta(version)]`,
///   `#[relmeta(belongs_to_many, join_name = "book_category")]`
///
/// Relation fields must be `Option<T>` (`belongs_to`, `has_one`) or `Vec<T>`
/// (`has_many`, `belongs_to_many`, and `belongs_to_many_ids` with scalar `T`).
///
/// The struct attribute `#[relmeta(hooks)]` leaves `RecordHooks` to a manual impl.
///
/// # Example
///
/// ```ignore
/// use relmeta::Record;
///
/// #[derive(Record, Default)]
/// pub struct CategoryInfo {
///     #[relmeta(pk, auto_incr)]
///     pub category_info_id: i64,
///     pub category_id: String,
///     #[relmeta(belongs_to)]
///     pub category: Option<Box<Category>>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(db, relmeta))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
