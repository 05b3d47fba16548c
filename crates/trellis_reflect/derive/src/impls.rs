//! Code generation for `#[derive(Reflect)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Generics, Ident, parse_quote};

use crate::derive_data::{EnumDerive, ReflectDerive, ReflectKind, StructDerive};

// -----------------------------------------------------------------------------
// Entry

pub(crate) fn expand(derive: &ReflectDerive<'_>) -> TokenStream {
    let type_path_impl = expand_type_path(derive);
    let kind_impls = match &derive.kind {
        ReflectKind::Struct(data) => expand_struct(derive, data),
        ReflectKind::Enum(data) => expand_enum(derive, data),
    };
    let meta_impl = expand_get_type_meta(derive);
    let auto_register = expand_auto_register(derive);

    quote! {
        const _: () = {
            #type_path_impl
            #kind_impls
            #meta_impl
            #auto_register
        };
    }
}

fn bounded_generics(derive: &ReflectDerive<'_>) -> Generics {
    let mut generics = derive.input.generics.clone();
    let params: Vec<Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(parse_quote!(
            #param: trellis_reflect::Reflect
                + trellis_reflect::info::Typed
                + trellis_reflect::registry::GetTypeMeta
        ));
    }
    generics
}

// -----------------------------------------------------------------------------
// TypePath

fn expand_type_path(derive: &ReflectDerive<'_>) -> TokenStream {
    let ident = &derive.input.ident;
    let ident_str = ident.to_string();
    let generics = bounded_generics(derive);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let type_params: Vec<&Ident> = derive
        .input
        .generics
        .type_params()
        .map(|p| &p.ident)
        .collect();

    // Module prefix: pinned by attribute, or taken from the defining module.
    let (module_expr, ident_for_path): (TokenStream, String) = match &derive.pinned_path {
        Some((module, pinned_ident)) => {
            let module = module.clone();
            (quote!(#module), pinned_ident.clone())
        }
        None => (quote!(::core::module_path!()), ident_str.clone()),
    };

    if type_params.is_empty() {
        let path_expr = match &derive.pinned_path {
            Some((module, pinned_ident)) => {
                let literal = format!("{module}::{pinned_ident}");
                quote!(#literal)
            }
            None => quote!(::core::concat!(::core::module_path!(), "::", #ident_str)),
        };
        let name = ident_for_path.clone();
        quote! {
            impl #impl_generics trellis_reflect::info::TypePath for #ident #ty_generics #where_clause {
                #[inline]
                fn type_path() -> &'static str {
                    #path_expr
                }

                #[inline]
                fn type_name() -> &'static str {
                    #name
                }

                #[inline]
                fn type_ident() -> &'static str {
                    #name
                }

                #[inline]
                fn module_path() -> ::core::option::Option<&'static str> {
                    ::core::option::Option::Some(#module_expr)
                }
            }
        }
    } else {
        let arg_slots = vec!["{}"; type_params.len()].join(", ");
        let path_format = format!("{{}}::{ident_for_path}<{arg_slots}>");
        let name_format = format!("{ident_for_path}<{arg_slots}>");
        let path_args = type_params.iter().map(|param| {
            quote!(<#param as trellis_reflect::info::TypePath>::type_path())
        });
        let name_args = type_params.iter().map(|param| {
            quote!(<#param as trellis_reflect::info::TypePath>::type_name())
        });
        let name = ident_for_path.clone();
        quote! {
            impl #impl_generics trellis_reflect::info::TypePath for #ident #ty_generics #where_clause {
                fn type_path() -> &'static str {
                    static CELL: trellis_reflect::impls::GenericTypePathCell =
                        trellis_reflect::impls::GenericTypePathCell::new();
                    CELL.get_or_insert::<Self>(|| {
                        ::std::format!(#path_format, #module_expr, #(#path_args),*)
                    })
                }

                fn type_name() -> &'static str {
                    static CELL: trellis_reflect::impls::GenericTypePathCell =
                        trellis_reflect::impls::GenericTypePathCell::new();
                    CELL.get_or_insert::<Self>(|| {
                        ::std::format!(#name_format, #(#name_args),*)
                    })
                }

                #[inline]
                fn type_ident() -> &'static str {
                    #name
                }

                #[inline]
                fn module_path() -> ::core::option::Option<&'static str> {
                    ::core::option::Option::Some(#module_expr)
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Reflect cast boilerplate

fn reflect_impl_body(ref_variant: TokenStream, mut_variant: TokenStream) -> TokenStream {
    quote! {
        #[inline]
        fn as_any(&self) -> &dyn ::core::any::Any {
            self
        }

        #[inline]
        fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
            self
        }

        #[inline]
        fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
            self
        }

        #[inline]
        fn as_reflect(&self) -> &dyn trellis_reflect::Reflect {
            self
        }

        #[inline]
        fn as_reflect_mut(&mut self) -> &mut dyn trellis_reflect::Reflect {
            self
        }

        #[inline]
        fn into_reflect(
            self: ::std::boxed::Box<Self>,
        ) -> ::std::boxed::Box<dyn trellis_reflect::Reflect> {
            self
        }

        #[inline]
        fn reflect_ref(&self) -> trellis_reflect::ops::ReflectRef<'_> {
            trellis_reflect::ops::ReflectRef::#ref_variant(self)
        }

        #[inline]
        fn reflect_mut(&mut self) -> trellis_reflect::ops::ReflectMut<'_> {
            trellis_reflect::ops::ReflectMut::#mut_variant(self)
        }
    }
}

// -----------------------------------------------------------------------------
// Structs

fn expand_struct(derive: &ReflectDerive<'_>, data: &StructDerive<'_>) -> TokenStream {
    let ident = &derive.input.ident;
    let generics = bounded_generics(derive);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let field_entries = data.fields.iter().map(|field| {
        let name = field.ident.to_string();
        let ty = field.ty;
        let mut entry = quote! {
            trellis_reflect::info::NamedField::new::<#ty>(#name)
        };
        if let Some(wire_name) = &field.wire_name {
            entry = quote!(#entry.with_wire_name(#wire_name));
        }
        if field.readonly {
            entry = quote!(#entry.readonly());
        }
        entry
    });

    let constructors = expand_constructors(derive, data);

    let is_generic = !derive.input.generics.params.is_empty();
    let typed_body = if is_generic {
        quote! {
            static CELL: trellis_reflect::impls::GenericTypeInfoCell =
                trellis_reflect::impls::GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| {
                trellis_reflect::info::TypeInfo::Struct(
                    trellis_reflect::info::StructInfo::new::<Self>(
                        ::std::vec![#(#field_entries),*],
                        #constructors,
                    ),
                )
            })
        }
    } else {
        quote! {
            static CELL: trellis_reflect::impls::NonGenericTypeInfoCell =
                trellis_reflect::impls::NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| {
                trellis_reflect::info::TypeInfo::Struct(
                    trellis_reflect::info::StructInfo::new::<Self>(
                        ::std::vec![#(#field_entries),*],
                        #constructors,
                    ),
                )
            })
        }
    };

    let field_arms = data.fields.iter().map(|field| {
        let field_ident = field.ident;
        let name = field.ident.to_string();
        quote!(#name => ::core::option::Option::Some(&self.#field_ident),)
    });
    let field_mut_arms = data.fields.iter().map(|field| {
        let field_ident = field.ident;
        let name = field.ident.to_string();
        quote!(#name => ::core::option::Option::Some(&mut self.#field_ident),)
    });
    let set_field_arms = data.fields.iter().map(|field| {
        let field_ident = field.ident;
        let name = field.ident.to_string();
        let ty = field.ty;
        if field.readonly {
            quote! {
                #name => ::core::result::Result::Err(
                    trellis_reflect::ops::SlotError::ReadOnly { field: #name },
                ),
            }
        } else {
            quote! {
                #name => {
                    self.#field_ident = match value.take::<#ty>() {
                        ::core::result::Result::Ok(value) => value,
                        ::core::result::Result::Err(value) => {
                            return ::core::result::Result::Err(
                                trellis_reflect::ops::SlotError::Mismatch {
                                    expected:
                                        <#ty as trellis_reflect::info::TypePath>::type_path(),
                                    received: trellis_reflect::info::DynamicTypePath::reflect_type_path(&*value),
                                },
                            );
                        }
                    };
                    ::core::result::Result::Ok(())
                }
            }
        }
    });

    let reflect_body = reflect_impl_body(quote!(Struct), quote!(Struct));

    quote! {
        impl #impl_generics trellis_reflect::info::Typed for #ident #ty_generics #where_clause {
            fn type_info() -> &'static trellis_reflect::info::TypeInfo {
                #typed_body
            }
        }

        impl #impl_generics trellis_reflect::Reflect for #ident #ty_generics #where_clause {
            #reflect_body
        }

        impl #impl_generics trellis_reflect::ops::ReflectStruct for #ident #ty_generics #where_clause {
            fn field(&self, name: &str) -> ::core::option::Option<&dyn trellis_reflect::Reflect> {
                match name {
                    #(#field_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn trellis_reflect::Reflect> {
                match name {
                    #(#field_mut_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::std::boxed::Box<dyn trellis_reflect::Reflect>,
            ) -> ::core::result::Result<(), trellis_reflect::ops::SlotError> {
                match name {
                    #(#set_field_arms)*
                    _ => ::core::result::Result::Err(
                        trellis_reflect::ops::SlotError::UnknownField {
                            field: name.to_string(),
                        },
                    ),
                }
            }
        }
    }
}

fn expand_constructors(derive: &ReflectDerive<'_>, data: &StructDerive<'_>) -> TokenStream {
    let mut entries: Vec<TokenStream> = Vec::new();

    if data.constructors.is_empty() {
        entries.push(expand_synthesized_constructor(data));
    } else {
        for ctor in &data.constructors {
            entries.push(expand_declared_constructor(data, ctor));
        }
    }

    if derive.with_default {
        entries.push(quote! {
            trellis_reflect::info::ConstructorInfo::new(&[], |_args| {
                ::core::result::Result::Ok(::std::boxed::Box::new(
                    <Self as ::core::default::Default>::default(),
                ))
            })
        });
    }

    quote!(::std::vec![#(#entries),*])
}

/// One `take_arg` + downcast statement per constructor parameter.
fn expand_param_take(name: &str, local: &Ident, ty: &syn::Type) -> TokenStream {
    quote! {
        let #local = match args.take_arg(#name) {
            ::core::option::Option::Some(value) => match value.take::<#ty>() {
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(value) => {
                    return ::core::result::Result::Err(
                        trellis_reflect::info::ConstructError::ArgType {
                            name: #name,
                            expected: <#ty as trellis_reflect::info::TypePath>::type_path(),
                            received: trellis_reflect::info::DynamicTypePath::reflect_type_path(&*value),
                        },
                    );
                }
            },
            ::core::option::Option::None => {
                return ::core::result::Result::Err(
                    trellis_reflect::info::ConstructError::MissingArg { name: #name },
                );
            }
        };
    }
}

fn expand_synthesized_constructor(data: &StructDerive<'_>) -> TokenStream {
    let names: Vec<String> = data
        .fields
        .iter()
        .map(|field| field.ident.to_string())
        .collect();
    let takes = data.fields.iter().map(|field| {
        let local = format_ident!("__{}", field.ident);
        expand_param_take(&field.ident.to_string(), &local, field.ty)
    });
    let inits = data.fields.iter().map(|field| {
        let field_ident = field.ident;
        let local = format_ident!("__{}", field.ident);
        quote!(#field_ident: #local)
    });
    let ignored_inits = data.ignored.iter().map(|field_ident| {
        quote!(#field_ident: ::core::default::Default::default())
    });

    quote! {
        trellis_reflect::info::ConstructorInfo::new(&[#(#names),*], |args| {
            #(#takes)*
            ::core::result::Result::Ok(::std::boxed::Box::new(Self {
                #(#inits,)*
                #(#ignored_inits,)*
            }))
        })
    }
}

fn expand_declared_constructor(
    data: &StructDerive<'_>,
    ctor: &crate::derive_data::ConstructorDerive,
) -> TokenStream {
    let names: Vec<String> = ctor.params.iter().map(Ident::to_string).collect();
    let takes = ctor.params.iter().map(|param| {
        // Validated during parsing: every parameter is a reflected field.
        let field = data
            .fields
            .iter()
            .find(|field| field.ident == param)
            .expect("validated constructor parameter");
        let local = format_ident!("__{}", param);
        expand_param_take(&param.to_string(), &local, field.ty)
    });
    let locals = ctor.params.iter().map(|param| format_ident!("__{}", param));
    let fn_name = &ctor.fn_name;

    quote! {
        trellis_reflect::info::ConstructorInfo::new(&[#(#names),*], |args| {
            #(#takes)*
            ::core::result::Result::Ok(::std::boxed::Box::new(Self::#fn_name(#(#locals),*)))
        })
    }
}

// -----------------------------------------------------------------------------
// Enums

fn expand_enum(derive: &ReflectDerive<'_>, data: &EnumDerive<'_>) -> TokenStream {
    let ident = &derive.input.ident;
    let generics = bounded_generics(derive);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let variant_names: Vec<String> = data.variants.iter().map(|v| v.to_string()).collect();
    let from_name_arms = data.variants.iter().map(|variant| {
        let name = variant.to_string();
        quote! {
            #name => ::core::option::Option::Some(
                ::std::boxed::Box::new(Self::#variant) as ::std::boxed::Box<dyn trellis_reflect::Reflect>
            ),
        }
    });
    let variant_name_arms = data.variants.iter().map(|variant| {
        let name = variant.to_string();
        quote!(Self::#variant => #name,)
    });

    let reflect_body = reflect_impl_body(quote!(Enum), quote!(Enum));

    quote! {
        impl #impl_generics trellis_reflect::info::Typed for #ident #ty_generics #where_clause {
            fn type_info() -> &'static trellis_reflect::info::TypeInfo {
                static CELL: trellis_reflect::impls::NonGenericTypeInfoCell =
                    trellis_reflect::impls::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    trellis_reflect::info::TypeInfo::Enum(
                        trellis_reflect::info::EnumInfo::new::<Self>(
                            &[#(#variant_names),*],
                            |name| match name {
                                #(#from_name_arms)*
                                _ => ::core::option::Option::None,
                            },
                        ),
                    )
                })
            }
        }

        impl #impl_generics trellis_reflect::Reflect for #ident #ty_generics #where_clause {
            #reflect_body
        }

        impl #impl_generics trellis_reflect::ops::ReflectEnum for #ident #ty_generics #where_clause {
            fn variant_name(&self) -> &'static str {
                match self {
                    #(#variant_name_arms)*
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta / auto registration

fn expand_get_type_meta(derive: &ReflectDerive<'_>) -> TokenStream {
    let ident = &derive.input.ident;
    let generics = bounded_generics(derive);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let default_trait = derive.with_default.then(|| {
        quote! {
            meta.insert_trait::<trellis_reflect::registry::TypeTraitDefault>(
                trellis_reflect::registry::FromType::<Self>::from_type(),
            );
        }
    });

    let dependencies = match &derive.kind {
        ReflectKind::Struct(data) => {
            let types = data.fields.iter().map(|field| field.ty);
            quote!(#(registry.register::<#types>();)*)
        }
        ReflectKind::Enum(_) => quote!(),
    };

    quote! {
        impl #impl_generics trellis_reflect::registry::GetTypeMeta for #ident #ty_generics #where_clause {
            fn get_type_meta() -> trellis_reflect::registry::TypeMeta {
                #[allow(unused_mut)]
                let mut meta = trellis_reflect::registry::TypeMeta::of::<Self>();
                #default_trait
                meta
            }

            fn register_dependencies(registry: &mut trellis_reflect::registry::TypeRegistry) {
                #dependencies
            }
        }
    }
}

fn expand_auto_register(derive: &ReflectDerive<'_>) -> TokenStream {
    if !derive.auto_register || !cfg!(feature = "auto_register") {
        return quote!();
    }
    let ident = &derive.input.ident;
    quote! {
        trellis_reflect::__macro_exports::auto_register::inventory::submit! {
            trellis_reflect::__macro_exports::auto_register::AutoRegistration {
                register: |registry| registry.register::<#ident>(),
            }
        }
    }
}
