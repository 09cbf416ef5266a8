extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::parse_macro_input;
use syn::spanned::Spanned;

/// Derive `lamellar_dr::Dist` for a plain data type so it can be stored in a `DistributedVector`.
///
/// The type must also be `Copy + Send + Sync + Debug + 'static`; the derive only
/// checks that it is not a union, the trait bounds are enforced by the compiler.
#[proc_macro_error]
#[proc_macro_derive(Dist)]
pub fn derive_dist(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    if let syn::Data::Union(_) = input.data {
        abort!(input.span(), "Dist cannot be derived for unions");
    }
    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let output = quote! {
        const _: () = {
            extern crate lamellar_dr as __lamellar;
            impl #impl_generics __lamellar::Dist for #name #ty_generics #where_clause {}
        };
    };
    TokenStream::from(output)
}
