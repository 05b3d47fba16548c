//! Parsed form of a `#[derive(Reflect)]` item.

use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericParam, Ident, LitStr, Type};

use crate::REFLECT_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// ReflectDerive

/// Everything the code generator needs, extracted and validated.
pub(crate) struct ReflectDerive<'a> {
    pub input: &'a DeriveInput,
    pub kind: ReflectKind<'a>,
    /// `#[reflect(type_path = "...")]`, split at the last segment.
    pub pinned_path: Option<(String, String)>,
    /// `#[reflect(default)]`.
    pub with_default: bool,
    /// `#[reflect(auto_register)]`.
    pub auto_register: bool,
}

pub(crate) enum ReflectKind<'a> {
    Struct(StructDerive<'a>),
    Enum(EnumDerive<'a>),
}

pub(crate) struct StructDerive<'a> {
    /// Reflected fields, in declaration order.
    pub fields: Vec<FieldDerive<'a>>,
    /// Ignored fields, filled from `Default` by synthesized constructors.
    pub ignored: Vec<&'a Ident>,
    /// `#[reflect(constructor = "...")]` declarations, in order.
    pub constructors: Vec<ConstructorDerive>,
}

pub(crate) struct FieldDerive<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub wire_name: Option<String>,
    pub readonly: bool,
}

pub(crate) struct ConstructorDerive {
    pub fn_name: Ident,
    pub params: Vec<Ident>,
}

pub(crate) struct EnumDerive<'a> {
    pub variants: Vec<&'a Ident>,
}

impl<'a> ReflectDerive<'a> {
    pub fn parse(input: &'a DeriveInput) -> syn::Result<Self> {
        for param in &input.generics.params {
            match param {
                GenericParam::Type(_) => {}
                GenericParam::Lifetime(param) => {
                    return Err(syn::Error::new(
                        param.span(),
                        "#[derive(Reflect)] requires 'static types; lifetime parameters are not supported",
                    ));
                }
                GenericParam::Const(param) => {
                    return Err(syn::Error::new(
                        param.span(),
                        "#[derive(Reflect)] does not support const generic parameters",
                    ));
                }
            }
        }

        let mut pinned_path = None;
        let mut with_default = false;
        let mut auto_register = false;
        let mut constructors = Vec::new();

        for attr in &input.attrs {
            if !attr.path().is_ident(REFLECT_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    with_default = true;
                    Ok(())
                } else if meta.path.is_ident("auto_register") {
                    auto_register = true;
                    Ok(())
                } else if meta.path.is_ident("type_path") {
                    let lit: LitStr = meta.value()?.parse()?;
                    pinned_path = Some(split_pinned_path(&lit)?);
                    Ok(())
                } else if meta.path.is_ident("constructor") {
                    let lit: LitStr = meta.value()?.parse()?;
                    constructors.push(parse_constructor(&lit)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown `reflect` attribute"))
                }
            })?;
        }

        if auto_register && !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.ident.span(),
                "#[reflect(auto_register)] is limited to non-generic types",
            ));
        }

        let kind = match &input.data {
            Data::Struct(data) => {
                let fields = match &data.fields {
                    Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
                    Fields::Unit => Vec::new(),
                    Fields::Unnamed(fields) => {
                        return Err(syn::Error::new(
                            fields.span(),
                            "#[derive(Reflect)] requires named fields",
                        ));
                    }
                };
                ReflectKind::Struct(Self::parse_struct(fields, &constructors)?)
            }
            Data::Enum(data) => {
                if !constructors.is_empty() {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "#[reflect(constructor = ...)] applies to structs only",
                    ));
                }
                if !input.generics.params.is_empty() {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "#[derive(Reflect)] does not support generic enums",
                    ));
                }
                let mut variants = Vec::new();
                for variant in &data.variants {
                    if !matches!(variant.fields, Fields::Unit) {
                        return Err(syn::Error::new(
                            variant.span(),
                            "#[derive(Reflect)] supports fieldless enums only",
                        ));
                    }
                    variants.push(&variant.ident);
                }
                ReflectKind::Enum(EnumDerive { variants })
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span(),
                    "#[derive(Reflect)] does not support unions",
                ));
            }
        };

        Ok(Self {
            input,
            kind,
            pinned_path,
            with_default,
            auto_register,
        })
    }

    fn parse_struct(
        raw_fields: Vec<&'a syn::Field>,
        constructors: &[ConstructorDerive],
    ) -> syn::Result<StructDerive<'a>> {
        let mut fields = Vec::new();
        let mut ignored = Vec::new();

        for field in raw_fields {
            let ident = field.ident.as_ref().expect("named field");
            let mut wire_name = None;
            let mut readonly = false;
            let mut ignore = false;

            for attr in &field.attrs {
                if !attr.path().is_ident(REFLECT_ATTRIBUTE_NAME) {
                    continue;
                }
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("readonly") {
                        readonly = true;
                        Ok(())
                    } else if meta.path.is_ident("ignore") {
                        ignore = true;
                        Ok(())
                    } else if meta.path.is_ident("rename") {
                        let lit: LitStr = meta.value()?.parse()?;
                        wire_name = Some(lit.value());
                        Ok(())
                    } else {
                        Err(meta.error("unknown `reflect` field attribute"))
                    }
                })?;
            }

            if ignore {
                ignored.push(ident);
            } else {
                fields.push(FieldDerive {
                    ident,
                    ty: &field.ty,
                    wire_name,
                    readonly,
                });
            }
        }

        // Constructor parameters must resolve to reflected fields; the
        // deserializer matches them against document keys by field name.
        let constructors = constructors
            .iter()
            .map(|ctor| {
                for param in &ctor.params {
                    if !fields.iter().any(|field| field.ident == param) {
                        return Err(syn::Error::new(
                            param.span(),
                            format!("constructor parameter `{param}` is not a reflected field"),
                        ));
                    }
                }
                Ok(ConstructorDerive {
                    fn_name: ctor.fn_name.clone(),
                    params: ctor.params.clone(),
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(StructDerive {
            fields,
            ignored,
            constructors,
        })
    }
}

// -----------------------------------------------------------------------------
// Attribute value parsing

/// Splits `"my_crate::foo::Foo"` into `("my_crate::foo", "Foo")`.
fn split_pinned_path(lit: &LitStr) -> syn::Result<(String, String)> {
    let value = lit.value();
    let trimmed = value.trim_start_matches("::");
    match trimmed.rsplit_once("::") {
        Some((module, ident)) if !module.is_empty() && !ident.is_empty() => {
            Ok((module.to_string(), ident.to_string()))
        }
        _ => Err(syn::Error::new(
            lit.span(),
            "`type_path` must contain at least one module segment, like \"my_crate::Foo\"",
        )),
    }
}

/// Parses `"fn_name(param, param)"`.
fn parse_constructor(lit: &LitStr) -> syn::Result<ConstructorDerive> {
    let value = lit.value();
    let bad = || {
        syn::Error::new(
            lit.span(),
            "`constructor` must look like \"fn_name(param_a, param_b)\"",
        )
    };

    let (name, rest) = value.split_once('(').ok_or_else(bad)?;
    let params = rest.strip_suffix(')').ok_or_else(bad)?;

    let fn_name: Ident = syn::parse_str(name.trim()).map_err(|_| bad())?;
    let params = params
        .split(',')
        .map(str::trim)
        .filter(|param| !param.is_empty())
        .map(|param| syn::parse_str::<Ident>(param).map_err(|_| bad()))
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(ConstructorDerive { fn_name, params })
}
