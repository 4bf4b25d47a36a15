// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::fmt;

use proc_macro::TokenStream;
use quote::quote;

enum Visibility {
    Public(proc_macro2::Span),
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public(..) => "public",
            Self::Private => "private",
        })
    }
}

impl Visibility {
    fn into_syn(self) -> syn::Visibility {
        match self {
            Self::Public(span) => {
                syn::Visibility::Public(syn::token::Pub { span })
            }
            Self::Private => syn::Visibility::Inherited,
        }
    }
}

impl syn::parse::Parse for Visibility {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let identifier = input.parse::<syn::Ident>()?;
        match identifier.to_string().as_str() {
            "public" => Ok(Self::Public(identifier.span())),
            "private" => Ok(Self::Private),
            _ => Err(syn::Error::new_spanned(
                identifier,
                "Unexpected visibility: expected `public` or `private`",
            )),
        }
    }
}

struct EnumTagsArgs {
    visibility: Visibility,
    repr_type: syn::Type,
}

impl syn::parse::Parse for EnumTagsArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        mod kw {
            use syn::custom_keyword;

            custom_keyword!(repr);
        }

        let visibility = input.parse()?;

        input.parse::<syn::Token![,]>().map_err(|mut error| {
            error.combine(syn::Error::new(
                input.span(),
                format!("Missing comma after `{}` visibility", visibility),
            ));
            error
        })?;

        input.parse::<kw::repr>().map_err(|mut error| {
            error.combine(syn::Error::new(
                input.span(),
                format!("Missing `repr` after `{},`", visibility),
            ));
            error
        })?;

        let content;
        syn::parenthesized!(content in input);
        let repr_type = content.parse()?;

        Ok(Self {
            visibility,
            repr_type,
        })
    }
}

/// What the generated `impl` needs to know about one variant.
struct TaggedVariant {
    name: syn::Ident,
    tag_ident: syn::Ident,
    mnemonic: String,
    discriminant: usize,
    pattern: proc_macro2::TokenStream,
}

/// Assigns every variant its tag, following Rust's discriminant rules:
/// an explicit literal resets the counter, otherwise it counts up from the
/// previous variant.
fn collect_variants(
    variants: impl Iterator<Item = syn::Variant>,
) -> syn::Result<Vec<TaggedVariant>> {
    let mut tagged = vec![];
    let mut next_discriminant = 0;

    for variant in variants {
        let name = variant.ident;
        let mnemonic = name.to_string().to_ascii_uppercase();
        let tag_ident = quote::format_ident!("{}_TAG", mnemonic);

        let discriminant = match variant.discriminant {
            Some((
                _,
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Int(int_literal),
                    ..
                }),
            )) => int_literal.base10_parse::<usize>()?,
            Some((_, other)) => {
                return Err(syn::Error::new_spanned(
                    other,
                    "Only literal discriminants are allowed",
                ));
            }
            None => next_discriminant,
        };
        next_discriminant = discriminant + 1;

        let pattern = match variant.fields {
            syn::Fields::Named(_) => quote! { Self::#name { .. } },
            syn::Fields::Unnamed(_) => quote! { Self::#name(..) },
            syn::Fields::Unit => quote! { Self::#name },
        };

        tagged.push(TaggedVariant {
            name,
            tag_ident,
            mnemonic,
            discriminant,
            pattern,
        });
    }

    Ok(tagged)
}

fn impl_enum_tags(
    visibility: syn::Visibility,
    enum_name: syn::Ident,
    repr_type: syn::Type,
    variants: &[TaggedVariant],
) -> proc_macro2::TokenStream {
    let count = variants.len();

    let tag_consts = variants.iter().map(|variant| {
        let TaggedVariant {
            name,
            tag_ident,
            discriminant,
            ..
        } = variant;
        quote! {
            #[doc = concat!("`#[enum_tags]`-generated tag for the variant `Self::", stringify!(#name), "`.")]
            #visibility const #tag_ident: #repr_type = #discriminant as _;
        }
    });

    let tag_idents = variants.iter().map(|variant| &variant.tag_ident);

    let tag_cases = variants.iter().map(|variant| {
        let TaggedVariant {
            pattern,
            discriminant,
            ..
        } = variant;
        quote! { #pattern => #discriminant as _ }
    });

    let mnemonic_cases = variants.iter().map(|variant| {
        let TaggedVariant {
            pattern, mnemonic, ..
        } = variant;
        quote! { #pattern => #mnemonic }
    });

    let mnemonic_of_cases = variants.iter().map(|variant| {
        let TaggedVariant {
            tag_ident,
            mnemonic,
            ..
        } = variant;
        quote! { Self::#tag_ident => Some(#mnemonic) }
    });

    quote! {
        impl #enum_name {
            #(#tag_consts)*

            #[doc = "`#[enum_tags]`-generated list of every variant's tag, in declaration order."]
            #visibility const TAGS: [#repr_type; #count] = [#(Self::#tag_idents),*];

            #[doc = "`#[enum_tags]`-generated getter for this variant's tag."]
            #visibility const fn tag(&self) -> #repr_type {
                match self {
                    #(#tag_cases),*
                }
            }

            #[doc = "`#[enum_tags]`-generated upper-case name of this variant."]
            #visibility const fn mnemonic(&self) -> &'static str {
                match self {
                    #(#mnemonic_cases),*
                }
            }

            #[doc = "`#[enum_tags]`-generated lookup from a tag to its variant's upper-case name."]
            #visibility const fn mnemonic_of(tag: #repr_type) -> Option<&'static str> {
                match tag {
                    #(#mnemonic_of_cases,)*
                    _ => None,
                }
            }
        }
    }
}

/// Constructs an `impl` for the given `enum` with constants for the
/// discriminant value of each variant, plus mnemonic lookups derived from
/// the variant names.
///
/// Usage examples:
///
/// * `#[enum_tags(public, repr(u8))]`
/// * `#[enum_tags(private, repr(u32))]`
///
/// Literal discriminants in any radix are honoured, so an instruction set can
/// spell its opcodes as `Ldi(u8, u8) = 0b1000_0010` (this needs a
/// `#[repr(..)]` on the `enum` itself).
///
/// Note that the `repr` type can be any numerical type to which a `usize` can
/// be casted to implicitly with the `as` keyword --- it is not the same as the
/// type for which you may `#[repr(...)]` the `enum`.
#[proc_macro_attribute]
pub fn enum_tags(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(args as EnumTagsArgs);

    let input_item = syn::parse_macro_input!(input as syn::DeriveInput);
    let input_item_cloned = input_item.clone();

    let data_enum = match input_item.data {
        syn::Data::Enum(data_enum) => data_enum,
        syn::Data::Struct(syn::DataStruct {
            struct_token: syn::token::Struct { span },
            ..
        })
        | syn::Data::Union(syn::DataUnion {
            union_token: syn::token::Union { span },
            ..
        }) => {
            return syn::Error::new(span, "Item must be an `enum`")
                .into_compile_error()
                .into();
        }
    };

    let variants = match collect_variants(data_enum.variants.into_iter()) {
        Ok(variants) => variants,
        Err(error) => return error.into_compile_error().into(),
    };

    let tags_impl = impl_enum_tags(
        args.visibility.into_syn(),
        input_item.ident,
        args.repr_type,
        &variants,
    );

    quote! {
        #input_item_cloned

        #tags_impl
    }
    .into()
}
