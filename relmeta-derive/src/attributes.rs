//! Attribute parsing utilities

use syn::parse::ParseStream;
use syn::{Attribute, Field, GenericArgument, LitStr, PathArguments, Type};

/// Relation kind tokens and the field shape each one populates
pub const RELATION_KINDS: [(&str, Shape); 5] = [
    ("belongs_to", Shape::One),
    ("has_many", Shape::Many),
    ("has_one", Shape::One),
    ("belongs_to_many", Shape::Many),
    ("belongs_to_many_ids", Shape::Ids),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    One,
    Many,
    Ids,
}

/// Storage mapping from `#[db(...)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Column(String),
    Skip,
    Flatten,
}

/// Everything the derive reads from one field
pub struct FieldAttrs {
    pub storage: Option<Storage>,
    /// `#[relmeta(...)]` tokens in mini-language form (`key` or `key=value`)
    pub tokens: Vec<String>,
}

impl FieldAttrs {
    pub fn parse(field: &Field) -> syn::Result<Self> {
        let mut storage = None;
        let mut tokens = Vec::new();
        for attr in &field.attrs {
            if attr.path().is_ident("db") {
                if storage.is_some() {
                    return Err(syn::Error::new_spanned(attr, "duplicate #[db] attribute"));
                }
                storage = Some(parse_db(attr)?);
            } else if attr.path().is_ident("relmeta") {
                tokens.extend(parse_tokens(attr)?);
            }
        }
        Ok(Self { storage, tokens })
    }

    pub fn tag(&self) -> String {
        self.tokens.join(",")
    }

    /// The single relation kind token, if any
    pub fn relation_kind(&self, field: &Field) -> syn::Result<Option<(&'static str, Shape)>> {
        let kinds: Vec<_> = RELATION_KINDS
            .iter()
            .filter(|(token, _)| self.tokens.iter().any(|t| t == token))
            .copied()
            .collect();
        match kinds.as_slice() {
            [] => Ok(None),
            [kind] => Ok(Some(*kind)),
            _ => Err(syn::Error::new_spanned(
                field,
                "relation kinds are mutually exclusive; use exactly one of belongs_to, has_many, \
                 has_one, belongs_to_many, belongs_to_many_ids",
            )),
        }
    }
}

fn parse_db(attr: &Attribute) -> syn::Result<Storage> {
    attr.parse_args_with(|input: ParseStream| {
        if input.peek(LitStr) {
            let column: LitStr = input.parse()?;
            if column.value().is_empty() {
                return Err(syn::Error::new(column.span(), "column name must not be empty"));
            }
            return Ok(Storage::Column(column.value()));
        }
        let ident: syn::Ident = input.parse()?;
        match ident.to_string().as_str() {
            "skip" => Ok(Storage::Skip),
            "flatten" => Ok(Storage::Flatten),
            _ => Err(syn::Error::new(
                ident.span(),
                "expected a column name string, `skip` or `flatten`",
            )),
        }
    })
}

fn parse_tokens(attr: &Attribute) -> syn::Result<Vec<String>> {
    let mut tokens = Vec::new();
    attr.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .map(|i| i.to_string())
            .ok_or_else(|| meta.error("expected a plain identifier"))?;
        if meta.input.peek(syn::Token![=]) {
            let value: LitStr = meta.value()?.parse()?;
            tokens.push(format!("{key}={}", value.value()));
        } else {
            tokens.push(key);
        }
        Ok(())
    })?;
    Ok(tokens)
}

/// True if the struct carries `#[relmeta(hooks)]`
pub fn has_custom_hooks(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut hooks = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("relmeta")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("hooks") {
                hooks = true;
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute, expected `hooks`"))
            }
        })?;
    }
    Ok(hooks)
}

/// `T` from `Wrapper<T>` when the last path segment is `wrapper`
pub fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
