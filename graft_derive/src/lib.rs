use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, DeriveInput, Field, Ident, LitStr};

#[derive(Default)]
struct ContainerAttrs {
    name: Option<String>,
    base: Option<String>,
    constructor: Option<Vec<Ident>>,
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    required: bool,
    ignore: bool,
    default: bool,
    readonly: bool,
}

fn graft_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("graft"))
}

fn container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut result = ContainerAttrs::default();
    for attr in graft_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("base") {
                result.base = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("constructor") {
                let mut params = Vec::new();
                meta.parse_nested_meta(|param| {
                    params.push(param.path.require_ident()?.clone());
                    Ok(())
                })?;
                result.constructor = Some(params);
            } else {
                return Err(meta.error("unrecognized graft container attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn field_attrs(f: &Field) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();
    for attr in graft_attrs(&f.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                result.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("required") {
                result.required = true;
            } else if meta.path.is_ident("ignore") {
                result.ignore = true;
            } else if meta.path.is_ident("default") {
                result.default = true;
            } else if meta.path.is_ident("readonly") {
                result.readonly = true;
            } else {
                return Err(meta.error("unrecognized graft field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

struct FieldInfo<'a> {
    ident: &'a Ident,
    ty: &'a syn::Type,
    attrs: FieldAttrs,
}

impl FieldInfo<'_> {
    fn member(&self) -> String {
        self.ident.to_string()
    }

    fn property(&self) -> String {
        self.attrs.rename.clone().unwrap_or_else(|| self.member())
    }
}

/// Describes a struct to the graft catalog and extracts it from
/// materialized values
///
/// ```ignore
/// use graft::Graft;
///
/// #[derive(Graft)]
/// #[graft(name = "Shapes.Circle", base = "Shape", constructor(radius))]
/// pub struct Circle {
///     radius: f64,
///     #[graft(rename = "fill", required)]
///     color: String,
///     #[graft(default)]
///     tags: Vec<String>,
///     #[graft(ignore)]
///     cached_area: Option<f64>,
/// }
/// ```
///
/// Container attributes:
///
/// - `#[graft(name = "...")]`: the registered type name, defaulting to the
///   struct name
/// - `#[graft(base = "...")]`: the base type a `$type` may narrow from
/// - `#[graft(constructor(a, b))]`: construct through a parameterized
///   constructor taking the listed fields instead of default constructing
///
/// Field attributes:
///
/// - `#[graft(rename = "...")]`
/// - `#[graft(required)]`
/// - `#[graft(ignore)]`: never read; the field takes its `Default`
/// - `#[graft(default)]`: fall back to `Default` when unset or null
/// - `#[graft(readonly)]`: only populated in place, never assigned
#[proc_macro_derive(Graft, attributes(graft))]
pub fn derive(input: TokenStream) -> TokenStream {
    let dinput = parse_macro_input!(input as DeriveInput);
    expand(dinput)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn expand(dinput: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_ident = &dinput.ident;
    if !dinput.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &dinput.generics,
            "Graft cannot be derived for generic structs",
        ));
    }

    let syn_struct = match &dinput.data {
        syn::Data::Struct(x) => x,
        _ => return Err(syn::Error::new_spanned(struct_ident, "expected struct")),
    };

    let named_fields = match &syn_struct.fields {
        syn::Fields::Named(x) => x,
        _ => return Err(syn::Error::new_spanned(struct_ident, "expected named fields")),
    };

    let container = container_attrs(&dinput.attrs)?;
    let type_name = container
        .name
        .clone()
        .unwrap_or_else(|| struct_ident.to_string());

    let mut fields = Vec::new();
    for f in &named_fields.named {
        let ident = f
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(f, "expected named field"))?;
        fields.push(FieldInfo {
            ident,
            ty: &f.ty,
            attrs: field_attrs(f)?,
        });
    }

    let members = fields.iter().map(|f| {
        let member = f.member();
        let ty = f.ty;
        let type_ref = if f.attrs.ignore {
            quote! { ::graft::TypeRef::Any }
        } else {
            quote! { <#ty as ::graft::Describe>::type_ref() }
        };

        let mut mapping = quote! { ::graft::MemberMapping::new(#member, #type_ref) };
        if let Some(rename) = &f.attrs.rename {
            mapping = quote! { #mapping.rename(#rename) };
        }
        if f.attrs.required {
            mapping = quote! { #mapping.required() };
        }
        if f.attrs.ignore {
            mapping = quote! { #mapping.ignored() };
        }
        if f.attrs.readonly {
            mapping = quote! { #mapping.readonly() };
        }
        quote! { .member(#mapping) }
    });

    let base = container.base.as_ref().map(|x| quote! { .base(#x) });

    let constructor = match &container.constructor {
        None => quote! { .default_constructor() },
        Some(params) => {
            let mut args = Vec::new();
            for param in params {
                let field = fields
                    .iter()
                    .find(|f| f.ident == param)
                    .ok_or_else(|| syn::Error::new_spanned(param, "constructor parameter is not a field"))?;
                let property = field.property();
                let member = field.member();
                args.push(quote! { ::graft::Parameter::new(#property).assigns(#member) });
            }
            quote! {
                .constructor(::graft::Constructor::assigning(#type_name, vec![#(#args),*]))
            }
        }
    };

    let nested = fields.iter().filter(|f| !f.attrs.ignore).map(|f| {
        let ty = f.ty;
        quote! { <#ty as ::graft::Describe>::register(catalog)?; }
    });

    let extract = fields.iter().map(|f| {
        let ident = f.ident;
        let member = f.member();
        if f.attrs.ignore {
            quote! { #ident: ::std::default::Default::default() }
        } else if f.attrs.default {
            quote! { #ident: ::graft::__private::field_or_default(&instance, #member)? }
        } else {
            quote! { #ident: ::graft::__private::field(&instance, #member)? }
        }
    });

    Ok(quote! {
        impl ::graft::Describe for #struct_ident {
            fn type_ref() -> ::graft::TypeRef {
                ::graft::TypeRef::named(#type_name)
            }

            fn register(catalog: &::graft::TypeCatalog) -> ::std::result::Result<(), ::graft::Error> {
                let fresh = catalog.get_or_register(#type_name, || {
                    ::graft::ObjectShape::builder(#type_name)
                        #base
                        #constructor
                        #(#members)*
                        .build()
                })?;

                if fresh {
                    #(#nested)*
                }

                ::std::result::Result::Ok(())
            }
        }

        impl ::graft::FromValue for #struct_ident {
            fn from_value(value: ::graft::Value) -> ::std::result::Result<Self, ::graft::Error> {
                let obj = ::graft::__private::object(value)?;
                let instance = obj.borrow();
                let result = #struct_ident {
                    #(#extract),*
                };
                ::std::result::Result::Ok(result)
            }
        }
    })
}
