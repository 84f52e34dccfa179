//! Expansion of `#[derive(Record)]`

use crate::attributes::{generic_arg, has_custom_hooks, FieldAttrs, Shape, Storage};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DataStruct, DeriveInput, Fields, Type};

enum Class<'a> {
    Column(String),
    Skip,
    Flatten,
    Relation { shape: Shape, target: &'a Type },
}

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let name = ident.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Record can only be derived for structs with named fields",
            ))
        }
    };

    let mut infos = Vec::new();
    let mut value_arms = Vec::new();
    let mut set_arms = Vec::new();
    let mut flatten_arms = Vec::new();
    let mut flatten_mut_arms = Vec::new();
    let mut target_arms = Vec::new();
    let mut id_arms = Vec::new();
    let mut inits = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_name = field_ident.to_string();
        let ty = &field.ty;
        let attrs = FieldAttrs::parse(field)?;
        let tag = attrs.tag();

        let class = match (attrs.relation_kind(field)?, &attrs.storage) {
            (Some(_), Some(Storage::Column(_) | Storage::Flatten)) => {
                return Err(syn::Error::new_spanned(
                    field,
                    "relation fields are never storage-mapped; drop the #[db] attribute",
                ))
            }
            (Some((token, shape)), _) => {
                let wrapper = if shape == Shape::One { "Option" } else { "Vec" };
                let target = generic_arg(ty, wrapper).ok_or_else(|| {
                    syn::Error::new_spanned(ty, format!("a `{token}` field must be a {wrapper}<T>"))
                })?;
                Class::Relation { shape, target }
            }
            (None, Some(Storage::Column(column))) => Class::Column(column.clone()),
            (None, Some(Storage::Skip)) => Class::Skip,
            (None, Some(Storage::Flatten)) => Class::Flatten,
            (None, None) => Class::Column(field_name.clone()),
        };

        match &class {
            Class::Column(column) => {
                infos.push(quote! {
                    ::relmeta::FieldInfo {
                        name: #field_name,
                        column: ::core::option::Option::Some(#column),
                        tag: #tag,
                        kind: ::relmeta::FieldKind::Scalar,
                    }
                });
                value_arms.push(quote! {
                    #index => ::core::option::Option::Some(
                        ::relmeta::sea_query::Value::from(::core::clone::Clone::clone(&self.#field_ident))
                    ),
                });
                set_arms.push(quote! {
                    #index => {
                        self.#field_ident = ::relmeta::row::decode::<#ty>(value, #column)?;
                        ::core::result::Result::Ok(())
                    }
                });
                inits.push(quote! { #field_ident: row.get::<#ty>(#column)?, });
            }
            Class::Skip => {
                infos.push(quote! {
                    ::relmeta::FieldInfo {
                        name: #field_name,
                        column: ::core::option::Option::None,
                        tag: #tag,
                        kind: ::relmeta::FieldKind::Scalar,
                    }
                });
                inits.push(quote! { #field_ident: ::core::default::Default::default(), });
            }
            Class::Flatten => {
                infos.push(quote! {
                    ::relmeta::FieldInfo {
                        name: #field_name,
                        column: ::core::option::Option::None,
                        tag: #tag,
                        kind: ::relmeta::FieldKind::Flatten(
                            <#ty as ::relmeta::Record>::fields
                                as fn() -> &'static [::relmeta::FieldInfo]
                        ),
                    }
                });
                flatten_arms.push(quote! {
                    #index => ::core::option::Option::Some(&self.#field_ident as &dyn ::relmeta::Record),
                });
                flatten_mut_arms.push(quote! {
                    #index => ::core::option::Option::Some(
                        &mut self.#field_ident as &mut dyn ::relmeta::Record
                    ),
                });
                inits.push(quote! { #field_ident: <#ty as ::relmeta::Record>::from_row(row)?, });
            }
            Class::Relation { shape, target } => {
                let (shape_tokens, target_tokens, handle) = match shape {
                    Shape::One => (
                        quote!(::relmeta::RelationShape::One),
                        quote! {
                            ::core::option::Option::Some(
                                <#target as ::relmeta::Record>::record_type as fn() -> ::relmeta::RecordType
                            )
                        },
                        quote!(::relmeta::RelationTarget::One(&mut self.#field_ident)),
                    ),
                    Shape::Many => (
                        quote!(::relmeta::RelationShape::Many),
                        quote! {
                            ::core::option::Option::Some(
                                <#target as ::relmeta::Record>::record_type as fn() -> ::relmeta::RecordType
                            )
                        },
                        quote!(::relmeta::RelationTarget::Many(&mut self.#field_ident)),
                    ),
                    Shape::Ids => (
                        quote!(::relmeta::RelationShape::Ids),
                        quote!(::core::option::Option::None),
                        quote!(::relmeta::RelationTarget::Ids(&mut self.#field_ident)),
                    ),
                };
                infos.push(quote! {
                    ::relmeta::FieldInfo {
                        name: #field_name,
                        column: ::core::option::Option::None,
                        tag: #tag,
                        kind: ::relmeta::FieldKind::Relation {
                            shape: #shape_tokens,
                            target: #target_tokens,
                        },
                    }
                });
                target_arms.push(quote! {
                    #index => ::core::option::Option::Some(#handle),
                });
                if *shape == Shape::Ids {
                    id_arms.push(quote! {
                        #index => ::core::option::Option::Some(::relmeta::IdSlot::values(&self.#field_ident)),
                    });
                }
                inits.push(quote! { #field_ident: ::core::default::Default::default(), });
            }
        }
    }

    let field_count = infos.len();

    let flatten_methods = (!flatten_arms.is_empty()).then(|| {
        quote! {
            fn flattened(&self, index: usize) -> ::core::option::Option<&dyn ::relmeta::Record> {
                match index {
                    #(#flatten_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn flattened_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::relmeta::Record> {
                match index {
                    #(#flatten_mut_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    });

    let target_method = (!target_arms.is_empty()).then(|| {
        quote! {
            fn relation_target(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<::relmeta::RelationTarget<'_>> {
                match index {
                    #(#target_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    });

    let ids_method = (!id_arms.is_empty()).then(|| {
        quote! {
            fn relation_ids(
                &self,
                index: usize,
            ) -> ::core::option::Option<::std::vec::Vec<::relmeta::sea_query::Value>> {
                match index {
                    #(#id_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    });

    let hooks = if has_custom_hooks(&input.attrs)? {
        quote!()
    } else {
        quote!(impl ::relmeta::RecordHooks for #ident {})
    };

    Ok(quote! {
        #hooks

        impl ::relmeta::Record for #ident {
            fn record_type() -> ::relmeta::RecordType {
                ::relmeta::RecordType::of::<Self>(#name)
            }

            fn fields() -> &'static [::relmeta::FieldInfo] {
                static FIELDS: [::relmeta::FieldInfo; #field_count] = [#(#infos),*];
                &FIELDS
            }

            fn from_row(row: &::relmeta::Row) -> ::relmeta::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#inits)*
                })
            }

            fn field_value(
                &self,
                index: usize,
            ) -> ::core::option::Option<::relmeta::sea_query::Value> {
                match index {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field_value(
                &mut self,
                index: usize,
                value: ::relmeta::sea_query::Value,
            ) -> ::relmeta::Result<()> {
                match index {
                    #(#set_arms)*
                    _ => {
                        let _ = value;
                        ::core::result::Result::Err(::relmeta::Error::TypeShape(::std::format!(
                            "{} has no storage-mapped field at index {}",
                            #name,
                            index
                        )))
                    }
                }
            }

            #flatten_methods
            #target_method
            #ids_method
        }
    })
}
