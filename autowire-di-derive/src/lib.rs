use crate::alias::{expand_component_alias, expand_injectable};
use crate::component::{expand_component, expand_component_impl, expand_discoverable};
use proc_macro::TokenStream;
use syn::parse::Nothing;
use syn::{parse_macro_input, DeriveInput, Error, ItemImpl, ItemTrait};

mod alias;
mod attributes;
mod component;

#[proc_macro_derive(Component, attributes(component))]
pub fn generate_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_component(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

#[proc_macro_derive(Discoverable)]
pub fn generate_discoverable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_discoverable(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Declares a component with explicit constructors. Supports `#[autowired]` and
/// `#[post_construct]` on methods, and `#[qualifier("Name")]` on constructor parameters.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as Nothing);
    let item = parse_macro_input!(item as ItemImpl);
    expand_component_impl(item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Makes `dyn Trait + Send + Sync` injectable.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as Nothing);
    let item = parse_macro_input!(item as ItemTrait);
    expand_injectable(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Registers the implementing component as assignable to `dyn Trait + Send + Sync`.
#[proc_macro_attribute]
pub fn component_alias(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as Nothing);
    let item = parse_macro_input!(item as ItemImpl);
    expand_component_alias(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
