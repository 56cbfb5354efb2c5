use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_derive(Cycle)]
pub fn derive_cycle(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Get the name of the enum
    let name = &input.ident;

    let expanded = match input.data {
        Data::Enum(data) => {
            if data.variants.is_empty() {
                quote! {
                    compile_error!("Cycle cannot be derived for an enum without variants");
                }
            } else if data
                .variants
                .iter()
                .any(|variant| !matches!(variant.fields, Fields::Unit))
            {
                quote! {
                    compile_error!("Cycle can only be derived for enums whose variants have no fields");
                }
            } else {
                let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();
                let indices = 0..variants.len();
                // each variant maps to the one declared after it, the last wraps to the first
                let successors = variants.iter().cycle().skip(1).take(variants.len());
                let current = variants.iter();
                let listed = variants.iter();
                let indexed = variants.iter();
                quote! {
                    impl Cycle for #name {
                        const VARIANTS: &'static [Self] = &[ #( #name::#listed ),* ];

                        fn index(self) -> usize {
                            match self {
                                #( #name::#indexed => #indices, )*
                            }
                        }

                        fn next(self) -> Self {
                            match self {
                                #( #name::#current => #name::#successors, )*
                            }
                        }
                    }
                }
            }
        }
        Data::Struct(_) => {
            quote! {
                compile_error!("Cycle cannot be derived for structs");
            }
        }
        Data::Union(_) => {
            quote! {
                compile_error!("Cycle cannot be derived for unions");
            }
        }
    };

    // Convert the generated tokens back into a TokenStream
    TokenStream::from(expanded)
}
