use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, ItemImpl, ItemTrait, Result, Type, TypePath};

pub fn expand_injectable(item: &ItemTrait) -> Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Generic traits cannot be injectable!",
        ));
    }

    let ident = &item.ident;
    Ok(quote! {
        #item

        #[automatically_derived]
        impl autowire_di::component::Injectable for dyn #ident + Send + Sync {}
    })
}

pub fn expand_component_alias(item: &ItemImpl) -> Result<TokenStream> {
    let trait_type = item
        .trait_
        .as_ref()
        .map(|(_, path, ..)| path)
        .ok_or_else(|| Error::new(item.span(), "Missing trait identifier!"))?;

    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Aliases of generic components are not supported!",
        ));
    }

    let Type::Path(TypePath {
        qself: None,
        path: target_type,
    }) = item.self_ty.as_ref()
    else {
        return Err(Error::new(
            item.self_ty.span(),
            "Aliases can only be registered for components!",
        ));
    };

    Ok(quote! {
        #item

        const _: () = {
            fn cast(
                instance: autowire_di::instance_provider::ComponentInstanceAnyPtr,
            ) -> Result<Box<dyn std::any::Any>, autowire_di::instance_provider::ComponentInstanceAnyPtr> {
                instance.downcast::<#target_type>().map(|instance| {
                    Box::new(instance as autowire_di::instance_provider::ComponentInstancePtr<dyn #trait_type + Send + Sync>)
                        as Box<dyn std::any::Any>
                })
            }

            fn register() -> autowire_di::component_registry::ComponentAliasDefinition {
                autowire_di::component_registry::ComponentAliasDefinition {
                    alias: autowire_di::component::TypeKey::of::<dyn #trait_type + Send + Sync>(),
                    target: autowire_di::component::TypeKey::of::<#target_type>(),
                    cast,
                }
            }

            autowire_di::component_registry::internal::submit! {
                autowire_di::component_registry::internal::ComponentAliasRegisterer {
                    register
                }
            };
        };
    })
}
