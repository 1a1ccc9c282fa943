use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::store::MemoryStore`. Both share the same fresh in-memory store, so a
/// test can drive the API through the client and inspect the records directly.
///
/// `#[backend_test(logging)]` additionally routes the crate's log output to the
/// test harness.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let (test_args, wants_client) = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let maybe_logging = parse_macro_input!(args as Option<Ident>)
        .and_then(|arg| {
            if arg == "logging" {
                Some(quote! {
                    log4rs_test_utils::test_logging::init_logging_once_for(
                        ["mj_backend"],
                        None,
                        None,
                    );
                })
            } else {
                None
            }
        })
        .unwrap_or_default();

    let maybe_client = if wants_client {
        quote! {
            let rocket = crate::rocket_for_store(
                std::sync::Arc::new(store.clone()),
                crate::config::Config::example(),
            );
            let rocket_client = rocket::local::asynchronous::Client::tracked(rocket)
                .await
                .unwrap();
        }
    } else {
        TokenStream2::new()
    };

    // Rewrite the test function.
    quote! {
        #[rocket::async_test]
        async fn #name() {
            #maybe_logging

            let store = crate::store::MemoryStore::new();
            #maybe_client

            /// The test itself.
            #item_fn

            #new_name(#(#test_args),*).await;
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<(Vec<TokenStream2>, bool), syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_store = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "MemoryStore" {
                        if has_store {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `MemoryStore`",
                            ));
                        }
                        has_store = true;
                        args.push(quote! { store.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `store_ident: MemoryStore`",
        ));
    }

    Ok((args, has_client))
}
