use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::parse::{Parse, ParseBuffer, ParseStream};
use syn::token::Brace;
use syn::Result;
use syn::{bracketed, parse_macro_input, FieldsNamed, Token};

struct WrapArgs {
    name: Ident,
    handle: Ident,
    fields: Option<FieldsNamed>,

    drop: Option<Ident>,
}

impl Parse for WrapArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = input.parse::<Ident>()?;

        input.parse::<Token![<]>()?;
        let handle = input.parse::<Ident>()?;
        input.parse::<Token![>]>()?;

        let fields = if input.peek(Brace) {
            Some(input.parse::<FieldsNamed>()?)
        } else {
            None
        };

        let drop = if input.peek(crate::keyword::drop) {
            input.parse::<crate::keyword::drop>()?;
            input.parse::<Token![+]>()?;
            let field: ParseBuffer = {
                let content;
                bracketed!(content in input);
                content
            };
            Some(field.parse::<Ident>()?)
        } else {
            None
        };

        if input.peek(Token![;]) {
            input.parse::<Token![;]>()?;
        }

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after wrapper declaration"));
        }

        Ok(WrapArgs {
            name,
            handle,
            fields,
            drop,
        })
    }
}

pub fn wrap_ffmpeg(token_stream: TokenStream) -> TokenStream {
    let WrapArgs {
        name,
        handle,
        fields,
        drop,
    } = parse_macro_input!(token_stream as WrapArgs);

    let fields = fields
        .map(|x| x.named.into_iter().collect::<Vec<_>>())
        .unwrap_or_default();

    let mut output = quote! {
        pub struct #name<N: crate::native::Native> {
            pub(crate) inner: *mut N::#handle,
            #(#fields,)*
        }

        impl<N: crate::native::Native> std::fmt::Debug for #name<N> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!(#name))
                    .field("inner", &self.inner)
                    .finish_non_exhaustive()
            }
        }
    };

    if let Some(drop) = drop {
        output.extend(quote! {
            impl<N: crate::native::Native> std::ops::Drop for #name<N> {
                fn drop(&mut self) {
                    if self.inner.is_null() {
                        return;
                    }

                    log::trace!("Releasing {} at {:p}", stringify!(#name), self.inner);
                    unsafe {
                        N::#drop(&mut self.inner as *mut *mut N::#handle);
                    }
                }
            }
        });
    }

    TokenStream::from(output)
}
