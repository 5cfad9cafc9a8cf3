//! Derive macros for rpcxml.
//!
//! `#[derive(Record)]` implements `rpcxml::Record` and `rpcxml::Encode` for a struct.
//! Fields are listed in declaration order. A field's wire name is its identifier
//! (or its index, for tuple structs) unless overridden:
//!
//! ```ignore
//! #[derive(Record)]
//! struct Login {
//!     #[rpc(rename = "user_name")]
//!     user: String,
//!     password: String,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Data;
use syn::DeriveInput;
use syn::Fields;
use syn::Index;
use syn::LitStr;
use syn::Member;
use syn::ext::IdentExt;
use syn::parse_quote;

/// Derive `Record` (fields as members or positional params) and `Encode` (the struct as a `<struct>` value).
#[proc_macro_derive(Record, attributes(rpc))]
pub fn record(input: TokenStream) -> TokenStream {
    handle_record(TokenStream2::from(input))
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn handle_record(input: TokenStream2) -> syn::Result<TokenStream2> {
    let mut ast: DeriveInput = syn::parse2(input)?;

    let fields = match &ast.data {
        Data::Struct(s) => wire_fields(&s.fields)?,
        Data::Enum(e) => {
            return Err(syn::Error::new_spanned(e.enum_token, "Record can only be derived for structs"));
        }
        Data::Union(u) => {
            return Err(syn::Error::new_spanned(u.union_token, "Record can only be derived for structs"));
        }
    };

    for param in ast.generics.type_params_mut() {
        param.bounds.push(parse_quote!(::rpcxml::Encode));
    }

    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let names = fields.iter().map(|(name, _)| name);
    let members = fields.iter().map(|(_, member)| member);

    Ok(quote! {
        impl #impl_generics ::rpcxml::Record for #ident #ty_generics #where_clause {
            fn fields(&self) -> ::std::vec::Vec<::rpcxml::Field<'_>> {
                ::std::vec![#(::rpcxml::Field::new(#names, &self.#members)),*]
            }
        }

        impl #impl_generics ::rpcxml::Encode for #ident #ty_generics #where_clause {
            fn encode(&self, enc: &mut ::rpcxml::Encoder) -> ::rpcxml::Result<()> {
                ::rpcxml::codec::encode_record_value(enc, self)
            }
        }
    })
}

/// Resolves (wire name, member) for each field, in declaration order.
fn wire_fields(fields: &Fields) -> syn::Result<Vec<(LitStr, Member)>> {
    let mut out = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        let (default_name, member) = match &field.ident {
            Some(ident) => (
                LitStr::new(&ident.unraw().to_string(), ident.span()),
                Member::Named(ident.clone()),
            ),
            None => {
                let index = Index::from(i);
                (LitStr::new(&i.to_string(), index.span), Member::Unnamed(index))
            }
        };
        let name = rename(field)?.unwrap_or(default_name);
        out.push((name, member));
    }
    Ok(out)
}

/// Reads `#[rpc(rename = "...")]`. The last one wins.
fn rename(field: &syn::Field) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("rpc") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                name = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported rpc attribute, expected `rename = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}
