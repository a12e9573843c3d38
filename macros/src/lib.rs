use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute for topicbus.
///
/// - `#[topicbus_macro::test]` on a sync fn: a plain `#[test]`.
/// - `#[topicbus_macro::test]` on an async fn: `#[tokio::test]`.
/// - `#[topicbus_macro::test(local)]`: single-threaded tokio runtime.
/// - `#[topicbus_macro::test(shared)]`: multi-threaded tokio runtime, for tests
///   where delivery tasks and the test body must make progress in parallel.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return error(
        raw_args.span(),
        "topicbus_macro::test flavor args are only supported for async tests. Use \
         #[topicbus_macro::test] for sync tests, or make the function async.",
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return error(raw_args.span(), USAGE);
    };

    match flavor.0.as_str() {
      "local" => quote!(flavor = "current_thread"),
      "shared" => quote!(flavor = "multi_thread", worker_threads = 2),
      _ => return error(flavor.1, USAGE),
    }
  };

  let native_attr = if is_async { quote!(tokio::test(#tokio_args)) } else { quote!(test) };

  let expanded = quote! {
      #[#native_attr]
      #input
  };

  TokenStream::from(expanded)
}

const USAGE: &str = "topicbus_macro::test only accepts: #[topicbus_macro::test], \
                     #[topicbus_macro::test(local)], #[topicbus_macro::test(shared)], or \
                     string equivalents";

fn error(span: proc_macro2::Span, msg: &str) -> TokenStream {
  TokenStream::from(syn::Error::new(span, msg).to_compile_error())
}
